//! Radix-tree request router with named middleware pipelines.
//!
//! # Registration
//!
//! Every route runs under exactly one pipeline, picked when the route is
//! registered:
//!
//! 1. no name, or an empty name → the base pipeline
//! 2. a name nobody created → the base pipeline (silent fallback)
//! 3. otherwise → the instance currently stored under that name
//!
//! The route keeps a [`PipelineId`], never the name, so re-creating a
//! pipeline under an existing name only affects routes registered after it.
//! Middleware attached later to an instance is seen by every route already
//! bound to that instance.
//!
//! # Dispatch
//!
//! Only routes whose method set accepts the request are candidates. Among
//! those the most specific pattern wins (static segment, then `{param}`, then
//! `{*catch_all}`), and between equally specific patterns the route
//! registered first. Base middleware wraps named middleware, which wraps the
//! handler.
//!
//! A `Router` is built through `&mut self` and then moved into the
//! [`Service`](crate::Service), where it is shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{debug, warn};

use crate::health;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::pipeline::{self, Pipeline, PipelineId};
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;

/// A route together with the pipeline it resolved to.
struct Binding {
    route: Route,
    pipeline: PipelineId,
    rank: Vec<u8>,
}

/// The application router.
///
/// One radix tree per HTTP method, plus one for routes with an empty method
/// set. Trees hold indices into the binding list, so a route accepting
/// several methods is stored once.
///
/// ```rust
/// use trellis::{Request, Response, Route, Router, StatusCode};
/// use trellis::middleware::Next;
///
/// async fn require_token(req: Request, next: Next) -> Response {
///     match req.header("authorization") {
///         Some(_) => next.run(req).await,
///         None => Response::status(StatusCode::UNAUTHORIZED),
///     }
/// }
/// async fn me(_req: Request) -> &'static str { "alice" }
///
/// let mut app = Router::new();
/// app.attach("auth", require_token)
///     .health()
///     .route(Route::get("/me", me).middleware("auth"));
/// ```
pub struct Router {
    pipelines: Vec<Pipeline>,
    // Flattened base + named chain per pipeline, rebuilt on attach.
    stacks: Vec<Arc<[BoxedMiddleware]>>,
    names: HashMap<String, PipelineId>,
    bindings: Vec<Binding>,
    routes: HashMap<Method, MatchitRouter<usize>>,
    any: MatchitRouter<usize>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            pipelines: vec![Pipeline::new("")],
            stacks: vec![Arc::from(Vec::new())],
            names: HashMap::new(),
            bindings: Vec::new(),
            routes: HashMap::new(),
            any: MatchitRouter::new(),
        }
    }

    // ── Pipelines ────────────────────────────────────────────────────────────

    /// Creates an empty pipeline and stores it under `name`.
    ///
    /// An existing pipeline with the same name is replaced for future
    /// registrations only. The empty name always denotes the base pipeline.
    pub fn create_pipeline(&mut self, name: &str) -> PipelineId {
        if name.is_empty() {
            return PipelineId::BASE;
        }

        let id = PipelineId(self.pipelines.len());
        self.pipelines.push(Pipeline::new(name));
        let stack = self.flatten(id);
        self.stacks.push(stack);

        if self.names.insert(name.to_owned(), id).is_some() {
            warn!(pipeline = name, "pipeline replaced, earlier routes keep the previous instance");
        } else {
            debug!(pipeline = name, "pipeline created");
        }
        id
    }

    /// Appends `middleware` to the pipeline named `name`, creating the
    /// pipeline if the name is new. Call repeatedly to attach several; they
    /// run in call order.
    pub fn attach(&mut self, name: &str, middleware: impl Middleware) -> &mut Self {
        let id = match self.pipeline(name) {
            Some(id) => id,
            None => self.create_pipeline(name),
        };
        self.attach_to(id, middleware)
    }

    /// Appends `middleware` to a specific pipeline instance.
    pub fn attach_to(&mut self, id: PipelineId, middleware: impl Middleware) -> &mut Self {
        match self.pipelines.get_mut(id.0) {
            Some(pipeline) => {
                pipeline.push(Arc::new(middleware));
                self.restack(id);
            }
            None => warn!(?id, "middleware attached to a pipeline this router does not own"),
        }
        self
    }

    /// Appends `middleware` to the base pipeline. Affects every route, including
    /// ones already registered.
    pub fn base(&mut self, middleware: impl Middleware) -> &mut Self {
        self.attach_to(PipelineId::BASE, middleware)
    }

    /// The instance currently stored under `name`, if any.
    pub fn pipeline(&self, name: &str) -> Option<PipelineId> {
        if name.is_empty() {
            return Some(PipelineId::BASE);
        }
        self.names.get(name).copied()
    }

    /// Maps a route's middleware name to the pipeline it will run under.
    ///
    /// Empty and unknown names fall back to the base pipeline.
    pub fn resolve(&self, name: &str) -> PipelineId {
        match self.pipeline(name) {
            Some(id) => id,
            None => {
                debug!(pipeline = name, "unknown pipeline, using base");
                PipelineId::BASE
            }
        }
    }

    /// Base middleware feeds every stack, so a base change rebuilds them all.
    fn restack(&mut self, id: PipelineId) {
        let ids = if id.is_base() { 0..self.pipelines.len() } else { id.0..id.0 + 1 };
        for i in ids {
            let stack = self.flatten(PipelineId(i));
            self.stacks[i] = stack;
        }
    }

    fn flatten(&self, id: PipelineId) -> Arc<[BoxedMiddleware]> {
        let base = &self.pipelines[PipelineId::BASE.0];
        let named = if id.is_base() { None } else { self.pipelines.get(id.0) };
        pipeline::stack(base, named)
    }

    // ── Routes ───────────────────────────────────────────────────────────────

    /// Registers one route. Never fails: a pattern a method's tree cannot
    /// hold is logged and left unreachable for that method.
    ///
    /// Within one method the first route registered for a path keeps it,
    /// even when a later pattern only differs in parameter names.
    pub fn route(&mut self, route: Route) -> &mut Self {
        let pipeline = self.resolve(route.middleware.as_deref().unwrap_or_default());
        let index = self.bindings.len();

        let reachable = if route.methods.is_empty() {
            insert(&mut self.any, &route.path, index, "*")
        } else {
            let mut reachable = false;
            for method in &route.methods {
                let tree = self.routes.entry(method.clone()).or_default();
                reachable |= insert(tree, &route.path, index, method.as_str());
            }
            reachable
        };

        if reachable {
            debug!(
                path = %route.path,
                methods = ?route.methods,
                pipeline = %self.pipelines[pipeline.0].name,
                "route registered",
            );
            let rank = rank(&route.path);
            self.bindings.push(Binding { route, pipeline, rank });
        }
        self
    }

    /// Registers several routes. Each one is resolved on its own.
    pub fn routes(&mut self, routes: impl IntoIterator<Item = Route>) -> &mut Self {
        for route in routes {
            self.route(route);
        }
        self
    }

    /// Installs `GET /health` → `200 "ok"` on the base pipeline.
    pub fn health(&mut self) -> &mut Self {
        self.route(Route::get(health::PATH, health::liveness))
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Routes one request through its pipeline and handler.
    ///
    /// Unmatched path or method → `404 Not Found`.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let Some((binding, params)) = self.lookup(&req.method, req.uri.path()) else {
            debug!(method = %req.method, path = req.uri.path(), "no route matched");
            return Response::status(StatusCode::NOT_FOUND);
        };

        req.params = params;
        let stack = Arc::clone(&self.stacks[binding.pipeline.0]);
        Next::new(stack, Arc::clone(&binding.route.handler)).run(req).await
    }

    /// Searches the request method's tree, then the any-method tree. When
    /// both match, the more specific pattern answers; on a tie, the route
    /// registered first.
    fn lookup(&self, method: &Method, path: &str) -> Option<(&Binding, HashMap<String, String>)> {
        let specific = self.routes.get(method).and_then(|tree| tree.at(path).ok());
        let any = self.any.at(path).ok();

        let matched = match (specific, any) {
            (Some(specific), Some(any)) => {
                let (s, a) = (&self.bindings[*specific.value], &self.bindings[*any.value]);
                if (&a.rank, *any.value) < (&s.rank, *specific.value) { any } else { specific }
            }
            (specific, any) => specific.or(any)?,
        };

        let binding = &self.bindings[*matched.value];
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((binding, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn insert(tree: &mut MatchitRouter<usize>, path: &str, index: usize, method: &str) -> bool {
    match tree.insert(path, index) {
        Ok(()) => true,
        Err(e) => {
            warn!(path, method, "route unreachable: {e}");
            false
        }
    }
}

/// Per-segment specificity, lower is more specific: static, `{param}`,
/// `{*catch_all}`.
fn rank(pattern: &str) -> Vec<u8> {
    pattern
        .split('/')
        .map(|segment| match segment {
            s if s.contains("{*") => 2,
            s if s.contains('{') => 1,
            _ => 0,
        })
        .collect()
}
