//! Answers overlay requests read as JSON lines. Each request produces exactly one response line
//! on the output, in the order requests arrived.

use std::sync::Arc;

use anyhow::Result;
use protocol::{Request, Response, ResponseBody};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::store::{backend::KeyValueBackend, usage_store::UsageStore};

pub mod protocol;
pub mod shutdown;

/// Dispatches a single request to the store.
pub async fn handle_request<B: KeyValueBackend>(store: &UsageStore<B>, request: Request) -> Response {
    match dispatch(store, request).await {
        Ok(body) => Response::success(body),
        Err(e) => {
            error!("Request failed {e:?}");
            Response::failure(format!("{e:#}"))
        }
    }
}

async fn dispatch<B: KeyValueBackend>(store: &UsageStore<B>, request: Request) -> Result<ResponseBody> {
    let body = match request {
        Request::IncrementTime { domain, delta_ms } => {
            let outcome = store.record_time(&domain, delta_ms).await?;
            let summary = store.get_summary(&domain).await?;
            ResponseBody::Recorded { outcome, summary }
        }
        Request::GetSummary { domain } => ResponseBody::Summary {
            summary: store.get_summary(&domain).await?,
        },
        Request::GetDetails { domain } => ResponseBody::Details {
            details: store.get_details(&domain).await?,
        },
        Request::ToggleDomain { domain } => {
            let disabled = store.toggle_disabled(&domain).await?;
            let summary = store.get_summary(&domain).await?;
            ResponseBody::Toggled { disabled, summary }
        }
    };
    Ok(body)
}

/// Represents the request loop. Runs until the input ends or the shutdown token is cancelled.
pub struct HostModule<B: KeyValueBackend> {
    store: Arc<UsageStore<B>>,
    shutdown: CancellationToken,
}

impl<B: KeyValueBackend> HostModule<B> {
    pub fn new(store: Arc<UsageStore<B>>, shutdown: CancellationToken) -> Self {
        Self { store, shutdown }
    }

    pub async fn run(
        self,
        input: impl AsyncBufRead + Unpin,
        mut output: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Host shutting down");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                info!("Input closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            debug!("Processing request {line}");
            let response = match serde_json::from_str::<Request>(&line) {
                Ok(request) => handle_request(&self.store, request).await,
                Err(e) => {
                    warn!("Malformed request {line}: {e}");
                    Response::failure(format!("Malformed request: {e}"))
                }
            };

            let mut buffer = serde_json::to_vec(&response)?;
            buffer.push(b'\n');
            output.write_all(&buffer).await?;
            output.flush().await?;
        }

        self.shutdown.cancel();
        Ok(())
    }
}
