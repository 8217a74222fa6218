//! Newline-delimited JSON method channel.
//!
//! Each inbound line is one call, `{"id": 1, "method": "extractText", "arguments": {...}}`,
//! and receives exactly one outbound line, `{"id": 1, "result": "..."}`. Calls run
//! concurrently, so replies can arrive in a different order than the calls.

use crate::models::request::MethodCall;
use crate::services::bridge::OcrBridge;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Deserialize)]
struct InboundCall {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(flatten)]
    call: MethodCall,
}

/// One reply line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelReply {
    pub id: serde_json::Value,
    pub result: String,
}

/// Serve calls from `reader` until EOF, writing replies to `writer`.
///
/// Returns once every call read before EOF has been answered.
pub async fn serve<R, W>(bridge: Arc<OcrBridge>, reader: R, writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ChannelReply>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(reply) = rx.recv().await {
            let mut line = serde_json::to_vec(&reply)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut reader = BufReader::new(reader);
    let mut calls = JoinSet::new();
    let mut buf = Vec::new();

    // Calls already spawned still get their replies when reading fails
    let read_result = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }

        while let Some(joined) = calls.try_join_next() {
            log_join_error(joined);
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                let _ = tx.send(malformed_call(e));
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<InboundCall>(line) {
            Ok(inbound) => {
                let bridge = bridge.clone();
                let tx = tx.clone();
                calls.spawn(async move {
                    let result = bridge.invoke(inbound.call).await;
                    let _ = tx.send(ChannelReply {
                        id: inbound.id,
                        result,
                    });
                });
            }
            Err(e) => {
                let _ = tx.send(malformed_call(e));
            }
        }
    };

    while let Some(joined) = calls.join_next().await {
        log_join_error(joined);
    }
    drop(tx);

    let written = writer_task
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    read_result?;
    written
}

fn malformed_call(error: impl std::fmt::Display) -> ChannelReply {
    tracing::warn!(error = %error, "Malformed method call on channel");
    ChannelReply {
        id: serde_json::Value::Null,
        result: format!("Malformed method call: {}", error),
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Method call task panicked");
    }
}
