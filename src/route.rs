//! Route values handed to [`Router::route`](crate::Router::route).

use http::Method;

use crate::handler::{BoxedHandler, Handler};

/// A path pattern bound to a handler, an optional pipeline name and a
/// method set.
///
/// An empty method set accepts every method. Pattern syntax is `{name}` for
/// a single segment and `{*name}` for the rest of the path.
///
/// ```rust
/// use trellis::{Method, Request, Route};
///
/// async fn list(_req: Request) -> &'static str { "[]" }
///
/// let route = Route::new("/users", list)
///     .methods([Method::GET, Method::HEAD])
///     .middleware("auth");
/// ```
pub struct Route {
    pub(crate) path: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware: Option<String>,
    pub(crate) methods: Vec<Method>,
}

impl Route {
    /// A route that answers every method on `path`.
    pub fn new(path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            path: path.into(),
            handler: handler.into_boxed_handler(),
            middleware: None,
            methods: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(path, handler).method(Method::GET)
    }

    pub fn post(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(path, handler).method(Method::POST)
    }

    pub fn put(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(path, handler).method(Method::PUT)
    }

    pub fn delete(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(path, handler).method(Method::DELETE)
    }

    /// Adds one accepted method.
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Adds several accepted methods, keeping first-seen order.
    pub fn methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Self::method)
    }

    /// Names the pipeline this route runs under. Resolved once, at registration.
    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware = Some(name.into());
        self
    }

    pub fn path(&self) -> &str { &self.path }

    /// `true` when `method` is in the set, or the set is empty.
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    async fn noop(_req: Request) -> &'static str { "" }

    #[test]
    fn empty_method_set_accepts_anything() {
        let route = Route::new("/", noop);
        assert!(route.accepts(&Method::GET));
        assert!(route.accepts(&Method::from_bytes(b"PURGE").unwrap()));
    }

    #[test]
    fn methods_are_deduplicated_in_order() {
        let route = Route::get("/", noop).methods([Method::HEAD, Method::GET]);
        assert_eq!(route.methods, [Method::GET, Method::HEAD]);
        assert!(!route.accepts(&Method::POST));
    }
}
