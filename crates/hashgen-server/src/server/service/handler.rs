//! HTTP service implementation for digest batches.
//!
//! This module defines [`HashService`], which owns the [`Distributor`] shared
//! by every request, and the axum handlers for the two `/v1/hash` endpoints.
//!
//! ## Responsibilities
//!
//! - Parse and bound the `{count}` path segment; the core never sees a bad
//!   count.
//! - Run sequential batches on the blocking pool so large counts do not stall
//!   the async workers.
//! - Run concurrent batches through the [`Distributor`], tied to the service's
//!   shutdown token.
//! - Record request metrics.

use super::error::ApiError;
use crate::server::{
    config::ServerConfig,
    telemetry::{
        decrement_batches_inflight, increment_batches_inflight, increment_digests_generated,
        increment_requests, record_batch_duration, record_digests_per_request,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use hashgen::{DigestBatch, DigestSource, Distributor, Error, OsDigest, generate_sequential};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Digest batch service shared by all request handlers.
///
/// Cloning is cheap; every clone shares the same [`Distributor`] and shutdown
/// token.
pub struct HashService<G: ?Sized = OsDigest> {
    distributor: Distributor<G>,
    max_allowed_hashes: usize,
    shutdown_token: CancellationToken,
}

impl<G: ?Sized> Clone for HashService<G> {
    fn clone(&self) -> Self {
        Self {
            distributor: self.distributor.clone(),
            max_allowed_hashes: self.max_allowed_hashes,
            shutdown_token: self.shutdown_token.clone(),
        }
    }
}

impl HashService<OsDigest> {
    /// Creates a service backed by the operating system's entropy source.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_source(Arc::new(OsDigest), config)
    }
}

impl<G: DigestSource + ?Sized + 'static> HashService<G> {
    pub fn with_source(source: Arc<G>, config: &ServerConfig) -> Self {
        Self {
            distributor: Distributor::from_arc(source, config.num_workers),
            max_allowed_hashes: config.max_allowed_hashes,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token cancelled when the service shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Cancels every in-flight concurrent batch. Those requests complete with
    /// `503 Service Unavailable`.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }

    /// Parses a `{count}` path segment and enforces `max_allowed_hashes`.
    pub fn parse_count(&self, raw: &str) -> Result<usize, ApiError> {
        let requested = raw.parse::<usize>().map_err(|_| ApiError::InvalidCount {
            raw: raw.to_string(),
        })?;

        if requested > self.max_allowed_hashes {
            return Err(ApiError::CountTooLarge {
                requested,
                max: self.max_allowed_hashes,
            });
        }

        Ok(requested)
    }

    /// Generates `count` digests one after another on the blocking pool.
    pub async fn sequential(&self, count: usize) -> Result<DigestBatch, ApiError> {
        let source = Arc::clone(self.distributor.source());
        let task = tokio::task::spawn_blocking(move || generate_sequential(&*source, count));

        let hashes = task.await.map_err(|e| Error::WorkerLost {
            context: format!("sequential task failed: {e}"),
        })??;

        Ok(DigestBatch::new(hashes))
    }

    /// Generates `count` digests across the worker pool.
    pub async fn concurrent(&self, count: usize) -> Result<DigestBatch, ApiError> {
        let hashes = self
            .distributor
            .distribute_with_cancel(count, &self.shutdown_token)
            .await?;

        Ok(DigestBatch::new(hashes))
    }

    async fn run(&self, raw: &str, mode: Mode) -> Result<Json<DigestBatch>, ApiError> {
        let count = self.parse_count(raw)?;

        increment_requests();
        record_digests_per_request(count as f64);
        increment_batches_inflight();
        let start = Instant::now();

        let result = match mode {
            Mode::Sequential => self.sequential(count).await,
            Mode::Concurrent => self.concurrent(count).await,
        };

        decrement_batches_inflight();
        let batch = result?;
        record_batch_duration(start.elapsed().as_secs_f64() * 1000.0);
        increment_digests_generated(batch.count as u64);

        #[cfg(feature = "tracing")]
        tracing::debug!("Generated {} digests ({mode:?})", batch.count);

        Ok(Json(batch))
    }
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    Sequential,
    Concurrent,
}

/// Body returned by the health endpoint.
#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// `GET /v1/hash/{count}/times`
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(count = %raw)))]
async fn hash_times<G>(
    State(service): State<HashService<G>>,
    Path(raw): Path<String>,
) -> Result<Json<DigestBatch>, ApiError>
where
    G: DigestSource + ?Sized + 'static,
{
    service.run(&raw, Mode::Sequential).await
}

/// `GET /v1/hash/{count}/times/concurrently`
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(count = %raw)))]
async fn hash_times_concurrently<G>(
    State(service): State<HashService<G>>,
    Path(raw): Path<String>,
) -> Result<Json<DigestBatch>, ApiError>
where
    G: DigestSource + ?Sized + 'static,
{
    service.run(&raw, Mode::Concurrent).await
}

/// Builds the HTTP routes for `service`.
pub fn build_router<G>(service: HashService<G>) -> Router
where
    G: DigestSource + ?Sized + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/v1/hash/{count}/times", get(hash_times::<G>))
        .route(
            "/v1/hash/{count}/times/concurrently",
            get(hash_times_concurrently::<G>),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use core::num::NonZeroUsize;
    use hashgen::{DIGEST_HEX_LEN, Digest};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DigestSource for CountingSource {
        fn generate(&self) -> hashgen::Result<Digest> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::EntropyUnavailable {
                    reason: "test".to_string(),
                });
            }
            OsDigest.generate()
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            num_workers: NonZeroUsize::new(8).unwrap(),
            max_allowed_hashes: 10_000,
            shutdown_timeout: 1,
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assert_batch(body: &Value, count: usize) {
        assert_eq!(body["count"], json!(count));
        let hashes = body["hashes"].as_array().unwrap();
        assert_eq!(hashes.len(), count);
        for hash in hashes {
            let hash = hash.as_str().unwrap();
            assert_eq!(hash.len(), DIGEST_HEX_LEN);
            assert!(hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_router(HashService::new(&test_config()));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn sequential_returns_requested_count() {
        let app = build_router(HashService::new(&test_config()));
        let (status, body) = get_json(app, "/v1/hash/5/times").await;
        assert_eq!(status, StatusCode::OK);
        assert_batch(&body, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_returns_requested_count() {
        let app = build_router(HashService::new(&test_config()));
        for count in [1, 5, 8, 9, 1000] {
            let (status, body) =
                get_json(app.clone(), &format!("/v1/hash/{count}/times/concurrently")).await;
            assert_eq!(status, StatusCode::OK);
            assert_batch(&body, count);
        }
    }

    #[tokio::test]
    async fn zero_count_is_an_empty_batch() {
        let source = Arc::new(CountingSource::default());
        let app = build_router(HashService::with_source(Arc::clone(&source), &test_config()));

        for uri in ["/v1/hash/0/times", "/v1/hash/0/times/concurrently"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"count": 0, "hashes": []}));
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_count_is_rejected_before_core() {
        let source = Arc::new(CountingSource::default());
        let app = build_router(HashService::with_source(Arc::clone(&source), &test_config()));

        for raw in ["abc", "-5", "1.5", "99999999999999999999999"] {
            for suffix in ["times", "times/concurrently"] {
                let (status, body) = get_json(app.clone(), &format!("/v1/hash/{raw}/{suffix}")).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}/{suffix}");
                assert_eq!(body, json!({"status": "failed"}));
            }
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn count_above_limit_is_rejected_before_core() {
        let source = Arc::new(CountingSource::default());
        let app = build_router(HashService::with_source(Arc::clone(&source), &test_config()));

        let (status, body) = get_json(app, "/v1/hash/10001/times/concurrently").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": "failed"}));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn generation_failure_is_a_server_error() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let app = build_router(HashService::with_source(source, &test_config()));

        for uri in ["/v1/hash/20/times", "/v1/hash/20/times/concurrently"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body, json!({"status": "failed"}));
        }
    }

    #[tokio::test]
    async fn concurrent_batches_after_shutdown_are_unavailable() {
        let service = HashService::new(&test_config());
        service.shutdown();
        let app = build_router(service);

        let (status, body) = get_json(app.clone(), "/v1/hash/10/times/concurrently").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"status": "failed"}));

        // Sequential batches are not tied to the shutdown token.
        let (status, _) = get_json(app, "/v1/hash/3/times").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn parse_count_bounds() {
        let service = HashService::new(&test_config());
        assert_eq!(service.parse_count("0").unwrap(), 0);
        assert_eq!(service.parse_count("10000").unwrap(), 10_000);
        assert!(matches!(
            service.parse_count("10001"),
            Err(ApiError::CountTooLarge { requested: 10_001, max: 10_000 })
        ));
        assert!(matches!(
            service.parse_count(""),
            Err(ApiError::InvalidCount { .. })
        ));
    }
}
