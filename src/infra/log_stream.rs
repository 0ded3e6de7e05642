//! Streaming log transport over HTTP.
//!
//! `GET {logging_endpoint}/apps/{guid}/stream` returns newline-delimited
//! JSON envelopes for as long as the connection stays open. A 2xx response
//! counts as connected.

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use futures_util::StreamExt as _;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::ports::{LogRepository, LogSinks};
use crate::domain::{LogMessage, TargetConfig};

/// Log transport holding at most one live subscription.
pub struct HttpLogStream {
    client: Client,
    base_url: String,
    token: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HttpLogStream {
    /// Creates a transport for the targeted logging endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(target: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: target.log_endpoint().trim_end_matches('/').to_owned(),
            token: target.access_token.clone(),
            task: Mutex::new(None),
        })
    }
}

impl LogRepository for HttpLogStream {
    fn tail_logs_for(&self, app_guid: &str, sinks: LogSinks) {
        let url = format!("{}/apps/{app_guid}/stream", self.base_url);
        let handle = tokio::spawn(stream_logs(
            self.client.clone(),
            url,
            self.token.clone(),
            sinks,
        ));
        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Aborting the task drops its sinks, which ends the message stream.
    fn close(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            debug!("aborting log stream");
            handle.abort();
        }
    }
}

async fn stream_logs(client: Client, url: String, token: String, sinks: LogSinks) {
    let LogSinks {
        on_connect,
        messages,
        errors,
    } = sinks;

    debug!(%url, "connecting to log server");
    let response = match client.get(&url).bearer_auth(&token).send().await {
        Ok(response) => response,
        Err(e) => {
            let _ = errors
                .send(anyhow::Error::new(e).context("connecting to log server"))
                .await;
            return;
        }
    };
    let status = response.status();
    if !status.is_success() {
        let _ = errors
            .send(anyhow::anyhow!("log server error ({status})"))
            .await;
        return;
    }
    let _ = on_connect.send(());

    let mut body = response.bytes_stream();
    let mut pending = Vec::new();
    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = errors
                    .send(anyhow::Error::new(e).context("reading log stream"))
                    .await;
                return;
            }
        };
        pending.extend_from_slice(&bytes);
        for line in take_lines(&mut pending) {
            match parse_line(&line) {
                Ok(Some(msg)) => {
                    if messages.send(msg).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "skipping undecodable log line"),
            }
        }
    }
    debug!("log server closed the stream");
}

/// Remove every complete line from `buf`, leaving any partial tail.
fn take_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
        return Vec::new();
    };
    let rest = buf.split_off(last_newline + 1);
    let complete = std::mem::replace(buf, rest);
    String::from_utf8_lossy(&complete)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Decode one envelope. Blank lines carry no message.
fn parse_line(line: &str) -> Result<Option<LogMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let msg = serde_json::from_str(line).context("invalid log envelope")?;
    Ok(Some(msg))
}
