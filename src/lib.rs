//! # trellis
//!
//! A small HTTP service substrate: a router whose routes run under named,
//! independently configured middleware pipelines, a service wrapper that owns
//! the listener, and a typed client for a remote users service.
//!
//! ## Pipelines
//!
//! - The **base** pipeline wraps every route.
//! - A **named** pipeline is created with [`Router::create_pipeline`] (or
//!   implicitly by [`Router::attach`]) and wraps only routes that name it.
//! - A route's name is resolved once, when it is registered. Unknown or empty
//!   names fall back to the base pipeline; no registration call can fail.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::middleware::{self, Next};
//! use trellis::{Request, Response, Route, Router, Service, ServiceConfig, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Router::new();
//!     app.base(middleware::trace)
//!         .health()
//!         .attach("auth", require_token)
//!         .routes([
//!             Route::get("/users/{id}", get_user).middleware("auth"),
//!             Route::post("/users", create_user).middleware("auth"),
//!         ]);
//!
//!     let config = ServiceConfig::from_env().writer(std::io::stdout());
//!     Service::new(config, app).start().await.unwrap();
//! }
//!
//! async fn require_token(req: Request, next: Next) -> Response {
//!     if req.header("authorization").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(req).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":99}"#)
//! }
//! ```

mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod client;
pub mod config;
pub mod health;
pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use pipeline::PipelineId;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use route::Route;
pub use router::Router;
pub use server::{DEFAULT_PORT, Service, ServiceConfig};
