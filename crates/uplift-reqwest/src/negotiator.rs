//! Temporary write URL negotiation over HTTP.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header;
use url::Url;

use uplift_core::{
    EndpointNegotiator, EndpointReply, EndpointRequest, EndpointResponse, Error, Result,
};

use crate::config::ReqwestConfig;
use crate::error::from_reqwest;
use crate::TRACING_TARGET_NEGOTIATOR;

/// Inner client that holds the HTTP client and configuration.
struct NegotiatorInner {
    http: Client,
    base_url: Url,
    config: ReqwestConfig,
}

/// Reqwest-based endpoint negotiator.
///
/// POSTs a path-segment encoded request to the backend and converts the
/// JSON reply into an [`EndpointResponse`]. Non-success statuses and
/// unparseable bodies are protocol violations; only the two documented
/// variants are valid.
#[derive(Clone)]
pub struct ReqwestNegotiator {
    inner: Arc<NegotiatorInner>,
}

impl std::fmt::Debug for ReqwestNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestNegotiator")
            .field("base_url", &self.inner.base_url)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestNegotiator {
    /// Creates a negotiator for the given backend base URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL cannot carry path
    /// segments or the HTTP client cannot be constructed.
    pub fn new(base_url: Url, config: ReqwestConfig) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::configuration()
                .with_message(format!("endpoint base URL cannot carry a path: {base_url}")));
        }

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET_NEGOTIATOR,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating negotiation client"
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

        let inner = NegotiatorInner {
            http,
            base_url,
            config,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Builds the full endpoint URL for one request.
    fn endpoint_url(&self, request: &EndpointRequest) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                Error::configuration()
                    .with_message("endpoint base URL cannot carry a path")
            })?;
            segments.pop_if_empty();
            segments.extend(request.path_segments());
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl EndpointNegotiator for ReqwestNegotiator {
    async fn negotiate(&self, request: &EndpointRequest) -> Result<EndpointResponse> {
        let url = self.endpoint_url(request)?;

        tracing::debug!(
            target: TRACING_TARGET_NEGOTIATOR,
            url = %url,
            base_name = %request.base_name,
            extension = %request.extension,
            "Requesting temporary write URL"
        );

        let response = self
            .inner
            .http
            .post(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::protocol_violation()
                .with_message(format!("endpoint answered with status {status}")));
        }

        let reply: EndpointReply = response.json().await.map_err(|err| {
            Error::protocol_violation()
                .with_message("endpoint reply was not valid JSON")
                .with_source(err)
        })?;
        let response = EndpointResponse::try_from(reply)?;

        match &response {
            EndpointResponse::Granted(write_url) => {
                tracing::debug!(
                    target: TRACING_TARGET_NEGOTIATOR,
                    write_url = %write_url,
                    "Temporary write URL granted"
                );
            }
            EndpointResponse::Denied(message) => {
                tracing::warn!(
                    target: TRACING_TARGET_NEGOTIATOR,
                    reason = %message,
                    "Temporary write URL denied"
                );
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negotiator(base: &str) -> ReqwestNegotiator {
        let base_url = Url::parse(base).unwrap();
        ReqwestNegotiator::new(base_url, ReqwestConfig::default()).unwrap()
    }

    #[test]
    fn test_endpoint_url_layout() {
        let request = EndpointRequest::new("photo", "jpg", "images/2024", "jpg png gif");
        let url = negotiator("https://cms.example").endpoint_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example/endpoint/filename/photo/type/jpg/images/2024/jpg%20png%20gif",
        );
    }

    #[test]
    fn test_endpoint_url_respects_base_path() {
        let request = EndpointRequest::new("photo", "jpg", "uploads", "jpg");
        let url = negotiator("https://cms.example/site/").endpoint_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example/site/endpoint/filename/photo/type/jpg/uploads/jpg",
        );
    }

    #[test]
    fn test_non_hierarchical_base_is_rejected() {
        let base_url = Url::parse("mailto:ops@cms.example").unwrap();
        let err = ReqwestNegotiator::new(base_url, ReqwestConfig::default()).unwrap_err();
        assert_eq!(err.kind, uplift_core::ErrorKind::Configuration);
    }
}
