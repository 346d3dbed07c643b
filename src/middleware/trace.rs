//! Per-request tracing middleware.

use std::time::{Duration, Instant};

use tracing::info;

use super::Next;
use crate::request::Request;
use crate::response::Response;

/// Logs one `info` event per request: method, path, status, latency.
///
/// Attach it first on the base pipeline so the latency covers every other
/// middleware as well:
///
/// ```rust
/// use trellis::{Router, middleware};
///
/// let mut app = Router::new();
/// app.base(middleware::trace);
/// ```
pub async fn trace(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.path().to_owned();
    let started = Instant::now();

    let res = next.run(req).await;

    info!(
        %method,
        path = %path,
        status = res.status_code().as_u16(),
        latency_us = micros(started.elapsed()),
        "request",
    );
    res
}

/// Saturates instead of truncating the `u128`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use crate::{Route, Router};

    #[tokio::test]
    async fn passes_the_response_through() {
        async fn created(_req: crate::Request) -> StatusCode {
            StatusCode::CREATED
        }

        let mut router = Router::new();
        router.base(super::trace).route(Route::post("/things", created));

        let req = http::Request::post("/things").body(Bytes::new()).unwrap();
        let res = router.dispatch(req.into()).await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }

    #[test]
    fn latency_saturates() {
        use std::time::Duration;

        assert_eq!(super::micros(Duration::from_millis(3)), 3_000);
        assert_eq!(super::micros(Duration::MAX), u64::MAX);
    }
}
