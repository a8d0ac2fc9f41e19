use super::{Middleware, Next};
use crate::container::{Scope, ScopeFactory};
use crate::http::{Request, RequestContext, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// Opens a fresh [`Scope`] for every request
///
/// Everything after this middleware runs inside the scope, so request-scoped
/// services resolve to one instance per request. The scope, and every
/// instance cached in it, is dropped when the response is ready.
pub struct RequestScoping {
    factory: ScopeFactory,
}

impl RequestScoping {
    pub fn new(factory: ScopeFactory) -> Self {
        Self { factory }
    }
}

impl Default for RequestScoping {
    fn default() -> Self {
        Self::new(Arc::new(Scope::new))
    }
}

#[async_trait]
impl Middleware for RequestScoping {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let scope = Arc::new((self.factory)());
        scope.attach_request(RequestContext::from_request(scope.id(), &request));
        tracing::trace!(scope = scope.id(), path = request.path(), "request scope opened");

        scope.enter(next(request)).await
    }
}
