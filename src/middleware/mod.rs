//! Middleware layer.
//!
//! A middleware wraps everything downstream of it: the rest of the pipeline
//! and, at the very end, the route handler. It receives the request together
//! with a [`Next`] cursor and decides what happens:
//!
//! - forward: `next.run(req).await`
//! - transform: edit `req` before forwarding, or the response after
//! - short-circuit: return a response without touching `next`
//!
//! ```rust
//! use trellis::middleware::Next;
//! use trellis::{Request, Response, StatusCode};
//!
//! async fn require_token(req: Request, next: Next) -> Response {
//!     if req.header("authorization").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(req).await
//! }
//! ```
//!
//! Middleware runs in attachment order: the first one attached is the
//! outermost wrapper and sees the request first and the response last.

mod trace;

pub use trace::trace;
pub use crate::handler::BoxFuture;

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Implemented by every middleware.
///
/// Any `async fn(Request, Next) -> impl IntoResponse` qualifies through the
/// blanket impl. Stateful middleware implements the trait on its own type.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// A middleware shared by every route bound to its pipeline.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of a middleware chain.
///
/// Consumed by [`run`](Next::run), so each stage can forward at most once.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    position: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        Self { stack, position: 0, endpoint }
    }

    /// Runs the next middleware, or the route handler once the chain is spent.
    pub async fn run(mut self, req: Request) -> Response {
        match self.stack.get(self.position).cloned() {
            Some(middleware) => {
                self.position += 1;
                middleware.handle(req, self).await
            }
            None => self.endpoint.call(req).await,
        }
    }
}
