//! Per-client fixed-window rate limiting backed by Redis.
//!
//! One counter per (bucket, client, minute): `INCR`, plus `EXPIRE` on the
//! first hit so stale windows clean themselves up. Redis being unreachable
//! never blocks traffic; the check fails open with a warning.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::AppError;

pub const WINDOW_SECS: u64 = 60;

const API_PREFIX: &str = "/api/v1";

/// Named limits, requests per minute per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateBucket {
    Upload,
    CreateMatch,
    Analyze,
    ResumeDetail,
    List,
    Delete,
}

impl RateBucket {
    pub fn limit(self) -> u64 {
        match self {
            Self::Upload | Self::CreateMatch | Self::Analyze => 5,
            Self::ResumeDetail => 30,
            Self::List => 50,
            Self::Delete => 10,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::CreateMatch => "create_match",
            Self::Analyze => "analyze",
            Self::ResumeDetail => "resume_detail",
            Self::List => "list",
            Self::Delete => "delete",
        }
    }
}

/// Redis key for the window containing `now_secs`.
pub fn window_key(bucket: RateBucket, client: &str, now_secs: u64) -> String {
    format!(
        "ratelimit:{}:{}:{}",
        bucket.as_str(),
        client,
        now_secs / WINDOW_SECS
    )
}

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    client: redis::Client,
    enabled: bool,
    // established on first use; dropped after any failed command so the next
    // request reconnects
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RateLimiter {
    pub fn new(client: redis::Client, enabled: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                enabled,
                connection: Mutex::new(None),
            }),
        }
    }

    /// Counts one request. `Err(TooManyRequests)` once the bucket limit is passed.
    pub async fn check(&self, bucket: RateBucket, client: &str) -> Result<(), AppError> {
        if !self.inner.enabled {
            return Ok(());
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let key = window_key(bucket, client, now);

        match self.increment(&key).await {
            Ok(count) if count > bucket.limit() => {
                debug!(client, bucket = bucket.as_str(), count, "rate limit exceeded");
                Err(AppError::TooManyRequests)
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("rate limiter unavailable, allowing request: {e}");
                Ok(())
            }
        }
    }

    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        let mut slot = self.inner.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.inner.client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn increment(&self, key: &str) -> redis::RedisResult<u64> {
        let mut conn = self.connection().await?;
        let result = count_hit(&mut conn, key).await;
        if result.is_err() {
            // a dead socket never recovers on its own
            self.inner.connection.lock().await.take();
        }
        result
    }
}

async fn count_hit(conn: &mut MultiplexedConnection, key: &str) -> redis::RedisResult<u64> {
    let count: u64 = redis::cmd("INCR").arg(key).query_async(conn).await?;
    if count == 1 {
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(WINDOW_SECS)
            .query_async::<_, ()>(conn)
            .await?;
    }
    Ok(count)
}

/// Which limit applies to a route, by method and route pattern (with or
/// without the `/api/v1` prefix). `None` means unlimited.
pub fn bucket_for(method: &Method, route: &str) -> Option<RateBucket> {
    let route = route.strip_prefix(API_PREFIX).unwrap_or(route);
    match (method.as_str(), route) {
        ("POST", "/resumes") => Some(RateBucket::Upload),
        ("POST", "/matches") => Some(RateBucket::CreateMatch),
        ("POST", "/analyze") => Some(RateBucket::Analyze),
        ("GET", "/resumes/:id") | ("GET", "/matches/:id") => Some(RateBucket::ResumeDetail),
        ("GET", "/resumes") | ("GET", "/matches") | ("GET", "/stats") => Some(RateBucket::List),
        ("DELETE", "/resumes/:id") | ("DELETE", "/matches/:id") => Some(RateBucket::Delete),
        _ => None,
    }
}

/// Clients are identified by peer IP.
fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Route-layer middleware: needs `MatchedPath`, so it must be installed with
/// `Router::route_layer`.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bucket = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| bucket_for(request.method(), path.as_str()));

    if let Some(bucket) = bucket {
        let client = client_id(&request);
        limiter.check(bucket, &client).await?;
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::post,
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn unreachable_redis() -> redis::Client {
        // nothing listens on port 1
        redis::Client::open("redis://127.0.0.1:1/").unwrap()
    }

    #[test]
    fn test_limits_per_bucket() {
        assert_eq!(RateBucket::Upload.limit(), 5);
        assert_eq!(RateBucket::CreateMatch.limit(), 5);
        assert_eq!(RateBucket::Analyze.limit(), 5);
        assert_eq!(RateBucket::ResumeDetail.limit(), 30);
        assert_eq!(RateBucket::List.limit(), 50);
        assert_eq!(RateBucket::Delete.limit(), 10);
    }

    #[test]
    fn test_window_key_is_fixed_per_minute() {
        let a = window_key(RateBucket::Upload, "10.0.0.1", 120);
        let b = window_key(RateBucket::Upload, "10.0.0.1", 179);
        let c = window_key(RateBucket::Upload, "10.0.0.1", 180);
        assert_eq!(a, "ratelimit:upload:10.0.0.1:2");
        assert_eq!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, window_key(RateBucket::Delete, "10.0.0.1", 120));
    }

    #[test]
    fn test_bucket_for_routes() {
        assert_eq!(bucket_for(&Method::POST, "/api/v1/resumes"), Some(RateBucket::Upload));
        assert_eq!(bucket_for(&Method::GET, "/api/v1/resumes"), Some(RateBucket::List));
        assert_eq!(bucket_for(&Method::GET, "/resumes/:id"), Some(RateBucket::ResumeDetail));
        assert_eq!(bucket_for(&Method::DELETE, "/api/v1/matches/:id"), Some(RateBucket::Delete));
        assert_eq!(bucket_for(&Method::POST, "/api/v1/analyze"), Some(RateBucket::Analyze));
        assert_eq!(bucket_for(&Method::GET, "/api/v1/stats"), Some(RateBucket::List));
        assert_eq!(bucket_for(&Method::GET, "/health"), None);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(unreachable_redis(), false);
        for _ in 0..20 {
            assert!(limiter.check(RateBucket::Upload, "c").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_fails_open_when_redis_is_down() {
        let limiter = RateLimiter::new(unreachable_redis(), true);
        let app = Router::new()
            .route("/resumes", post(|| async { "ok" }))
            .route_layer(from_fn_with_state(limiter, enforce_rate_limit));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/resumes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Name of the first RESP command in `buf` and the bytes it spans.
    fn parse_command(buf: &[u8]) -> Option<(String, usize)> {
        let line_end = |from: usize| {
            buf.get(from..)?
                .windows(2)
                .position(|w| w == b"\r\n")
                .map(|p| from + p)
        };
        if *buf.first()? != b'*' {
            return None;
        }
        let end = line_end(0)?;
        let args: usize = std::str::from_utf8(&buf[1..end]).ok()?.parse().ok()?;
        let mut pos = end + 2;
        let mut name = None;
        for _ in 0..args {
            if *buf.get(pos)? != b'$' {
                return None;
            }
            let end = line_end(pos)?;
            let len: usize = std::str::from_utf8(&buf[pos + 1..end]).ok()?.parse().ok()?;
            let start = end + 2;
            if buf.len() < start + len + 2 {
                return None;
            }
            if name.is_none() {
                name = Some(String::from_utf8_lossy(&buf[start..start + len]).to_ascii_uppercase());
            }
            pos = start + len + 2;
        }
        Some((name?, pos))
    }

    /// Minimal Redis stand-in. The first connection is closed right after
    /// answering its first INCR; later connections stay up.
    async fn flaky_redis(listener: TcpListener, connections: Arc<AtomicUsize>, incrs: Arc<AtomicUsize>) {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let nth = connections.fetch_add(1, Ordering::SeqCst) + 1;
            let incrs = incrs.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let Ok(read) = socket.read(&mut chunk).await else {
                        return;
                    };
                    if read == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..read]);
                    while let Some((name, used)) = parse_command(&buf) {
                        buf.drain(..used);
                        if name == "INCR" {
                            incrs.fetch_add(1, Ordering::SeqCst);
                            if socket.write_all(b":1\r\n").await.is_err() || nth == 1 {
                                return;
                            }
                        } else if socket.write_all(b"+OK\r\n").await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    }

    #[tokio::test]
    async fn test_reconnects_after_connection_drops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let incrs = Arc::new(AtomicUsize::new(0));
        tokio::spawn(flaky_redis(listener, connections.clone(), incrs.clone()));

        let client = redis::Client::open(format!("redis://{addr}/")).unwrap();
        let limiter = RateLimiter::new(client, true);

        for _ in 0..50 {
            // every call is allowed: either counted or failed open
            assert!(limiter.check(RateBucket::List, "10.0.0.7").await.is_ok());
            if connections.load(Ordering::SeqCst) >= 2 && incrs.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(connections.load(Ordering::SeqCst) >= 2, "limiter never reconnected");
        assert!(incrs.load(Ordering::SeqCst) >= 2, "no hits counted after reconnecting");
    }
}
