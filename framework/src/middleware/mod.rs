//! Request pipeline middleware
//!
//! A middleware receives the request together with the rest of the pipeline
//! as [`Next`]. It can answer on its own (static files), or wrap the call to
//! `next` (request scoping).
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::{async_trait, Middleware, Next, Request, Response};
//!
//! pub struct Timing;
//!
//! #[async_trait]
//! impl Middleware for Timing {
//!     async fn handle(&self, request: Request, next: Next) -> Response {
//!         let started = std::time::Instant::now();
//!         let response = next(request).await;
//!         tracing::debug!(elapsed = ?started.elapsed(), "handled");
//!         response
//!     }
//! }
//! ```

mod request_scoping;
mod static_files;

pub use request_scoping::RequestScoping;
pub use static_files::StaticFiles;

use crate::http::{Request, Response};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The remainder of the pipeline
pub type Next = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// A step of the request pipeline
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Type-erased middleware
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Box a middleware for storage in a chain
pub fn into_boxed<M: Middleware + 'static>(middleware: M) -> BoxedMiddleware {
    Arc::new(middleware)
}

/// Ordered list of middleware, first registered runs first
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    pub fn extend(&mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) {
        self.middleware.extend(middleware);
    }

    /// Move every middleware of `other` to the end of this chain
    pub fn append(&mut self, other: MiddlewareChain) {
        self.middleware.extend(other.middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Compose the chain around `endpoint` into a single callable
    pub fn into_next(self, endpoint: Next) -> Next {
        self.middleware
            .into_iter()
            .rev()
            .fold(endpoint, |next, middleware| {
                let composed: Next = Arc::new(move |request: Request| -> BoxFuture<Response> {
                    let middleware = middleware.clone();
                    let next = next.clone();
                    Box::pin(async move { middleware.handle(request, next).await })
                });
                composed
            })
    }

    /// Run the request through every middleware, ending at `endpoint`
    pub async fn execute(&self, request: Request, endpoint: Next) -> Response {
        let next = self.clone().into_next(endpoint);
        next(request).await
    }
}
