use crate::http::{Request, Response};
use crate::middleware::BoxFuture;
use http::Method;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Type alias for route handlers
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// A route that could not be registered
#[derive(Debug, thiserror::Error)]
#[error("invalid route '{method} {path}': {message}")]
pub struct RouteError {
    pub method: Method,
    pub path: String,
    pub message: String,
}

/// Method + path router for attribute routes
///
/// Paths use matchit syntax (`/api/StudentEndpoint/{id}`) and match
/// case-sensitively.
pub struct Router {
    get_routes: MatchitRouter<BoxedHandler>,
    post_routes: MatchitRouter<BoxedHandler>,
    put_routes: MatchitRouter<BoxedHandler>,
    delete_routes: MatchitRouter<BoxedHandler>,
    errors: Vec<RouteError>,
    count: usize,
}

impl Router {
    pub fn new() -> Self {
        Self {
            get_routes: MatchitRouter::new(),
            post_routes: MatchitRouter::new(),
            put_routes: MatchitRouter::new(),
            delete_routes: MatchitRouter::new(),
            errors: Vec::new(),
            count: 0,
        }
    }

    /// Register a GET route
    pub fn get<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Register a POST route
    pub fn post<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Register a PUT route
    pub fn put<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    /// Register a DELETE route
    pub fn delete<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Register a route for any supported method
    pub fn route<H, Fut>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: BoxedHandler =
            Arc::new(move |req: Request| -> BoxFuture<Response> { Box::pin(handler(req)) });
        self.insert(method, path, handler);
        self
    }

    /// Insert a pre-boxed handler
    pub fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        let router = match method {
            Method::GET => &mut self.get_routes,
            Method::POST => &mut self.post_routes,
            Method::PUT => &mut self.put_routes,
            Method::DELETE => &mut self.delete_routes,
            _ => {
                self.errors.push(RouteError {
                    method,
                    path: path.to_string(),
                    message: "unsupported method".to_string(),
                });
                return;
            }
        };

        match router.insert(path, handler) {
            Ok(()) => self.count += 1,
            Err(e) => self.errors.push(RouteError {
                method,
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Match a request and return the handler with extracted params
    pub fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let router = match *method {
            Method::GET | Method::HEAD => &self.get_routes,
            Method::POST => &self.post_routes,
            Method::PUT => &self.put_routes,
            Method::DELETE => &self.delete_routes,
            _ => return None,
        };

        router.at(path).ok().map(|matched| {
            let params: HashMap<String, String> = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (matched.value.clone(), params)
        })
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Registration failures collected so far
    pub fn errors(&self) -> &[RouteError] {
        &self.errors
    }

    /// Hand back the first registration failure, if any
    pub(crate) fn take_error(&mut self) -> Option<RouteError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
