//! Named middleware pipelines.
//!
//! Pipelines live in an arena owned by the [`Router`](crate::Router). A
//! [`PipelineId`] is an index into that arena, so a route bound to a pipeline
//! keeps pointing at the same instance even if its name is later given to a
//! fresh pipeline.

use std::sync::Arc;

use crate::middleware::BoxedMiddleware;

/// Handle to one pipeline instance inside a router.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PipelineId(pub(crate) usize);

impl PipelineId {
    /// The unnamed pipeline backing every route without a resolvable name.
    pub const BASE: Self = Self(0);

    pub fn is_base(self) -> bool {
        self == Self::BASE
    }
}

/// An ordered, append-only chain of middleware.
pub(crate) struct Pipeline {
    pub(crate) name: String,
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

impl Pipeline {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), middleware: Vec::new() }
    }

    pub(crate) fn push(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BoxedMiddleware> {
        self.middleware.iter()
    }
}

/// Flattens `outer` then `inner` into one shared stack, outermost first.
pub(crate) fn stack(outer: &Pipeline, inner: Option<&Pipeline>) -> Arc<[BoxedMiddleware]> {
    outer
        .iter()
        .chain(inner.into_iter().flat_map(|p| p.iter()))
        .cloned()
        .collect()
}
