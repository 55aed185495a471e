use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use reqwest::Client;
use rusty_compact_expfmt::{decode_with_options, DecodeOptions, MetadataStore};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Request header telling the producer which metadata version is cached, so
/// it can leave the metadata block out.
pub const METADATA_VERSION_HEADER: &str = "x-cpr-metadata-version";

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// State shared by every request: the upstream to fetch from and the
/// metadata cached from its previous answers.
#[derive(Clone)]
pub struct DecodeState {
    client: Client,
    remote_url: Arc<str>,
    store: Arc<MetadataStore>,
    options: Arc<DecodeOptions>,
}

impl DecodeState {
    pub fn new(remote_url: impl Into<Arc<str>>, options: DecodeOptions) -> Self {
        Self {
            client: Client::new(),
            remote_url: remote_url.into(),
            store: Arc::new(MetadataStore::new()),
            options: Arc::new(options),
        }
    }

    async fn fetch(&self) -> anyhow::Result<Bytes> {
        let mut request = self.client.get(&*self.remote_url);
        if let Some(version) = self.store.current_version() {
            request = request.header(METADATA_VERSION_HEADER, version.to_string());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", self.remote_url))?
            .error_for_status()
            .with_context(|| format!("upstream {} returned an error", self.remote_url))?;

        response
            .bytes()
            .await
            .with_context(|| format!("failed to read payload from {}", self.remote_url))
    }

    async fn fetch_and_decode(&self) -> anyhow::Result<String> {
        let payload = self.fetch().await?;
        debug!(bytes = payload.len(), "Fetched remote payload.");

        decode_with_options(&payload, &self.store, &self.options)
            .context("failed to decode remote payload")
    }
}

async fn handle_decode(State(state): State<DecodeState>, method: Method) -> Response {
    if method != Method::GET {
        debug!(%method, "Rejected request with unsupported method.");
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match state.fetch_and_decode().await {
        Ok(text) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            let message = format!("{:#}", e);
            error!(error = %message, "Failed to serve decoded payload.");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

/// Every path serves the decoded upstream payload.
pub fn router(state: DecodeState) -> Router {
    Router::new().fallback(handle_decode).with_state(state)
}

/// Serves decoded payloads from `remote_url` on `listen_addr` until Ctrl-C.
pub async fn run(
    remote_url: String,
    listen_addr: SocketAddr,
    options: DecodeOptions,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    info!(upstream = %remote_url, "HTTP server listening on {}.", listen_addr);

    let state = DecodeState::new(remote_url, options);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal. Stopping...");
            }
        })
        .await
        .context("HTTP server failed")
}

#[cfg(test)]
mod tests {
    use axum::{http::HeaderMap, routing::get};
    use rusty_compact_expfmt::{
        value_block::{Bucket, Sample, SamplePayload, ValueBlock, ValueFamily},
        Metadata, MetricFamilyMetadata, MetricType,
    };

    use super::*;

    const EXPECTED: &str = "# HELP size_bytes Object sizes.\n\
                            # TYPE size_bytes histogram\n\
                            size_bytes{,bucket=\"64\"} 2size_bytes_sum 80\n\
                            size_bytes_count 2\n";

    fn values() -> Vec<u8> {
        let mut payload: Vec<u8> = Vec::new();
        ValueBlock {
            version: 5,
            families: vec![ValueFamily {
                family_index: 0,
                samples: vec![Sample {
                    labels: Default::default(),
                    payload: SamplePayload::Histogram {
                        buckets: vec![Bucket {
                            upper_bound: 64.0,
                            cumulative_count: 2.0,
                        }],
                        sum: 80.0,
                        count: 2,
                    },
                }],
            }],
        }
        .write(&mut payload)
        .unwrap();
        payload
    }

    /// Producer that only sends metadata to clients that don't have version 5.
    async fn producer(headers: HeaderMap) -> Vec<u8> {
        let cached = headers
            .get(METADATA_VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            == Some("5");

        let mut payload: Vec<u8> = Vec::new();
        if !cached {
            Metadata::new(
                5,
                vec![MetricFamilyMetadata::new(
                    "size_bytes",
                    "Object sizes.",
                    MetricType::Histogram,
                    vec![],
                )],
            )
            .write(&mut payload)
            .unwrap();
        }
        payload.extend_from_slice(&values());
        payload
    }

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_decodes_and_caches_metadata() {
        let upstream = spawn_server(Router::new().route("/metrics", get(producer))).await;
        let state = DecodeState::new(
            format!("http://{}/metrics", upstream),
            DecodeOptions::default(),
        );
        let store = Arc::clone(&state.store);
        let addr = spawn_server(router(state)).await;

        let client = Client::new();
        for _ in 0..2 {
            let response = client
                .get(format!("http://{}/", addr))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                EXPOSITION_CONTENT_TYPE
            );
            assert_eq!(response.text().await.unwrap(), EXPECTED);
            assert_eq!(store.current_version(), Some(5));
        }
    }

    #[tokio::test]
    async fn test_rejects_other_methods() {
        let state = DecodeState::new("http://127.0.0.1:9/metrics", DecodeOptions::default());
        let addr = spawn_server(router(state)).await;

        let response = Client::new()
            .post(format!("http://{}/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_decode_errors_are_500() {
        // Without any metadata, the value block cannot be decoded
        let upstream =
            spawn_server(Router::new().route("/metrics", get(|| async { values() }))).await;
        let state = DecodeState::new(
            format!("http://{}/metrics", upstream),
            DecodeOptions::default(),
        );
        let addr = spawn_server(router(state)).await;

        let response = Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().await.unwrap().contains("version mismatch"));
    }

    #[tokio::test]
    async fn test_upstream_errors_are_500() {
        let upstream = spawn_server(Router::new()).await;
        let state = DecodeState::new(
            format!("http://{}/metrics", upstream),
            DecodeOptions::default(),
        );
        let addr = spawn_server(router(state)).await;

        let response = Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().await.unwrap().contains("returned an error"));
    }
}
