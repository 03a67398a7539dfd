//! CLI `chat` and `flush` commands.

use anyhow::Result;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use gauzmem::chat::{ChatSession, FLUSH_CONTENT_TYPE};
use gauzmem::config::GauzConfig;
use gauzmem::llm::LlmClient;

/// Interactive playground on stdin. `/quit`, EOF, or Ctrl-C ends the session,
/// and every ending path flushes the queued background writes.
pub async fn chat(config: &GauzConfig) -> Result<()> {
    let client = super::api_client(config)?;
    let llm = LlmClient::from_config(&config.llm)?;
    let mut session = ChatSession::new(client, llm, config.chat.clone());

    println!(
        "Memory playground ({}, model {}). Type /quit to exit.",
        config.api.project_id, config.llm.model
    );

    let outcome = converse(&mut session, BufReader::new(tokio::io::stdin()), ctrl_c()).await;

    let stats = session.close().await;
    println!(
        "\nSession closed: {} background write(s) completed, {} failed.",
        stats.completed, stats.failed
    );
    outcome
}

/// Resolves on the first Ctrl-C. Never resolves if the handler can't be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Read turns from `input` until `/quit`, EOF, or `interrupt` resolves.
async fn converse<R, F>(session: &mut ChatSession, input: R, interrupt: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut interrupt => {
                println!("\nInterrupted.");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        let pb = super::spinner("Recalling memories...");
        let reply = tokio::select! {
            reply = session.send(&line) => reply,
            () = &mut interrupt => {
                pb.finish_and_clear();
                println!("\nInterrupted.");
                break;
            }
        };
        pb.finish_and_clear();

        if let Some(msg) = reply {
            if let Some(ref recall) = msg.recall {
                println!(
                    "[{} recall fragment(s), {} fact(s)]",
                    recall.subgraphs, recall.facts
                );
            }
            println!("{}", msg.content);
        }
    }
    tracing::debug!(turns = session.messages().len(), "chat input closed");
    Ok(())
}

/// Flush the backend's source buffer.
pub async fn flush(config: &GauzConfig) -> Result<()> {
    let client = super::api_client(config)?;
    let result = client.flush_buffer(FLUSH_CONTENT_TYPE).await?;
    if result.flushed {
        println!("Buffer flushed.");
    } else {
        println!("Nothing to flush.");
    }
    Ok(())
}
