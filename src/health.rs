//! Liveness probe.
//!
//! [`Router::health`](crate::Router::health) installs [`liveness`] at
//! [`PATH`] on the base pipeline, so base middleware still applies: a
//! short-circuiting base middleware answers probes too.
//!
//! Register it first. Routes sharing a pattern are tried in registration
//! order, so a later `GET /health` never shadows it:
//!
//! ```rust
//! use trellis::Router;
//!
//! let mut app = Router::new();
//! app.health();
//! ```

use crate::{Request, Response};

/// Where [`Router::health`](crate::Router::health) mounts the probe.
pub const PATH: &str = "/health";

/// Always `200 OK` with body `"ok"`. No dependencies: if the process can
/// answer HTTP at all, it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}
