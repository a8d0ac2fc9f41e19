use crate::container::Scope;
use crate::http::Request;

/// Metadata of the request a [`Scope`] belongs to
///
/// Owned by the hosting layer and attached to the scope by the request
/// scoping middleware; applications receive it through the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Id of the request scope, usable as a request id in logs
    pub request_id: u64,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

impl RequestContext {
    pub fn from_request(request_id: u64, request: &Request) -> Self {
        Self {
            request_id,
            method: request.method().to_string(),
            path: request.path().to_string(),
            query: request.query().map(str::to_string),
        }
    }

    /// Context of the request whose scope is current, if any
    pub fn current() -> Option<Self> {
        Scope::current().and_then(|scope| scope.request().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_current_follows_scope() {
        assert_eq!(RequestContext::current(), None);

        let scope = Arc::new(Scope::new());
        let request = Request::get("/Student/Details/1?x=1");
        scope.attach_request(RequestContext::from_request(scope.id(), &request));

        let seen = scope.clone().enter(async { RequestContext::current() }).await;
        let seen = seen.unwrap();
        assert_eq!(seen.request_id, scope.id());
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.path, "/Student/Details/1");
        assert_eq!(seen.query.as_deref(), Some("x=1"));
    }
}
