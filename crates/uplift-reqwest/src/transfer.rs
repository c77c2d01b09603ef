//! Direct-to-storage transfer over HTTP.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header;
use reqwest::{Body, Client};
use tokio::sync::mpsc;

use uplift_core::{
    Error, ProgressSink, Result, SelectedFile, StorageTransfer, TemporaryWriteUrl,
    TransferProgress,
};

use crate::config::ReqwestConfig;
use crate::TRACING_TARGET_TRANSFER;

/// Size of the body chunks handed to the transport.
///
/// Also the granularity of progress samples: one sample per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Inner client that holds the HTTP client and configuration.
struct TransferInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based storage transfer.
///
/// Performs the single cross-origin PUT of the raw file bytes: explicit
/// content length, caching disabled, and no content-type header so the
/// bytes reach the endpoint unmodified. Progress samples are forwarded to
/// the sink while the request body drains.
#[derive(Clone)]
pub struct ReqwestTransfer {
    inner: Arc<TransferInner>,
}

impl std::fmt::Debug for ReqwestTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransfer")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransfer {
    /// Creates a transfer client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the HTTP client cannot be
    /// constructed.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET_TRANSFER,
            timeout_ms = timeout.as_millis(),
            "Creating transfer client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|err| {
                Error::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(err)
            })?;

        let inner = TransferInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }
}

/// Slices the contents into transport-sized chunks without copying.
fn split_chunks(mut contents: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(contents.len().div_ceil(chunk_size.max(1)));
    while !contents.is_empty() {
        let take = contents.len().min(chunk_size);
        chunks.push(contents.split_to(take));
    }
    chunks
}

#[async_trait::async_trait]
impl StorageTransfer for ReqwestTransfer {
    async fn put(
        &self,
        url: &TemporaryWriteUrl,
        file: &SelectedFile,
        progress: ProgressSink<'_>,
    ) -> Result<()> {
        let total = file.size();

        tracing::debug!(
            target: TRACING_TARGET_TRANSFER,
            file_name = %file.name,
            size = total,
            "Starting storage transfer"
        );

        // The body stream must be 'static, so samples cross back over a
        // channel to reach the borrowed sink.
        let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<TransferProgress>();
        let chunks = split_chunks(file.contents.clone(), CHUNK_SIZE);
        let body_stream = async_stream::stream! {
            let mut sent = 0u64;
            for chunk in chunks {
                sent += chunk.len() as u64;
                let _ = sample_tx.send(TransferProgress::computable(sent, total));
                yield Ok::<Bytes, std::convert::Infallible>(chunk);
            }
        };

        let request = self
            .inner
            .http
            .put(url.as_url().clone())
            .header(header::CACHE_CONTROL, "no-store")
            .header(header::CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body_stream))
            .send();
        tokio::pin!(request);

        let mut samples_open = true;
        let response = loop {
            tokio::select! {
                sample = sample_rx.recv(), if samples_open => match sample {
                    Some(sample) => progress(sample),
                    None => samples_open = false,
                },
                result = &mut request => break result.map_err(|err| {
                    Error::transfer().with_message(err.to_string()).with_source(err)
                })?,
            }
        };
        // The response can settle before the last samples are drained.
        while let Ok(sample) = sample_rx.try_recv() {
            progress(sample);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                format!("storage answered with status {status}")
            } else {
                format!("storage answered with status {status}: {body}")
            };
            return Err(Error::transfer().with_message(detail));
        }

        tracing::debug!(
            target: TRACING_TARGET_TRANSFER,
            file_name = %file.name,
            size = total,
            "Storage transfer completed"
        );
        Ok(())
    }
}
