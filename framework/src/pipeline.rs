//! Service registration and request pipeline assembly
//!
//! [`ServiceCollection`] is filled by `Startup::configure_services`; the
//! [`ApplicationBuilder`] built from it is then handed to `Startup::configure`,
//! which adds static files and MVC and produces the [`Pipeline`] the server
//! runs for every request.
//!
//! Request scoping, when registered, always runs first.

use crate::container::{Container, Scope, ScopeFactory};
use crate::error::FrameworkError;
use crate::http::{HttpResponse, Request, Response};
use crate::middleware::{
    into_boxed, BoxFuture, Middleware, MiddlewareChain, Next, RequestScoping, StaticFiles,
};
use crate::mvc::{Controller, ControllerRegistry, MvcMiddleware, RouteTable};
use std::path::PathBuf;
use std::sync::Arc;

/// Services registered before the container is built
#[derive(Default)]
pub struct ServiceCollection {
    controllers: ControllerRegistry,
    scope_factory: Option<ScopeFactory>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller type for MVC dispatch
    pub fn add_controller<C: Controller>(&mut self) -> &mut Self {
        self.controllers.add::<C>();
        self
    }

    /// Open a scope from `factory` at the start of every request
    pub fn add_request_scoping<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Scope + Send + Sync + 'static,
    {
        self.scope_factory = Some(Arc::new(factory));
        self
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn has_request_scoping(&self) -> bool {
        self.scope_factory.is_some()
    }
}

/// Assembles the request pipeline
pub struct ApplicationBuilder {
    services: ServiceCollection,
    chain: MiddlewareChain,
}

impl ApplicationBuilder {
    pub fn new(services: ServiceCollection) -> Self {
        Self {
            services,
            chain: MiddlewareChain::new(),
        }
    }

    /// Controller types registered with the services
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.services.controllers
    }

    /// Append a middleware
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.chain.push(into_boxed(middleware));
        self
    }

    /// Serve files under `web_root`
    pub fn use_static_files(&mut self, web_root: impl Into<PathBuf>) -> &mut Self {
        self.use_middleware(StaticFiles::new(web_root))
    }

    /// Dispatch to controllers resolved from `container`
    ///
    /// `configure` adds the conventional routes.
    pub fn use_mvc<F>(&mut self, container: Arc<Container>, configure: F) -> Result<&mut Self, FrameworkError>
    where
        F: FnOnce(&mut RouteTable) -> Result<(), crate::routing::RouteTemplateError>,
    {
        let mut routes = RouteTable::new();
        configure(&mut routes).map_err(|e| FrameworkError::Configuration(e.to_string()))?;

        let mvc = MvcMiddleware::new(container, self.services.controllers.clone(), routes)?;
        Ok(self.use_middleware(mvc))
    }

    /// Freeze the pipeline
    pub fn build(self) -> Pipeline {
        let mut chain = MiddlewareChain::new();
        if let Some(factory) = self.services.scope_factory {
            chain.push(into_boxed(RequestScoping::new(factory)));
        }
        chain.append(self.chain);

        let endpoint: Next = Arc::new(|request: Request| -> BoxFuture<Response> {
            Box::pin(async move { Err(not_found(&request)) })
        });

        Pipeline {
            entry: chain.into_next(endpoint),
        }
    }
}

fn not_found(request: &Request) -> HttpResponse {
    HttpResponse::json(serde_json::json!({
        "error": format!("No route matches {} {}", request.method(), request.path())
    }))
    .status(404)
}

/// The assembled request pipeline
#[derive(Clone)]
pub struct Pipeline {
    entry: Next,
}

impl Pipeline {
    /// Run a request through every middleware
    pub async fn handle(&self, request: Request) -> HttpResponse {
        (self.entry)(request).await.unwrap_or_else(|response| response)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerBuilder, Injectable};
    use crate::http::{json, RequestContext};
    use crate::mvc::Actions;
    use bytes::Bytes;
    use http::Method;

    struct Greeter {
        greeting: String,
    }

    struct HomeController {
        greeter: Arc<Greeter>,
        context: Arc<RequestContext>,
    }

    impl Injectable for HomeController {
        fn inject(container: &Container) -> Result<Self, FrameworkError> {
            Ok(Self {
                greeter: container.resolve()?,
                context: container.resolve()?,
            })
        }
    }

    impl HomeController {
        async fn index(self: Arc<Self>, _request: Request) -> Response {
            json(serde_json::json!({
                "greeting": self.greeter.greeting,
                "path": self.context.path,
            }))
        }

        async fn details(self: Arc<Self>, request: Request) -> Response {
            let id: i32 = request.param_as("id")?;
            json(serde_json::json!({ "id": id }))
        }

        async fn attribute(self: Arc<Self>, request: Request) -> Response {
            json(serde_json::json!({ "attribute": request.param("id")? }))
        }
    }

    impl Controller for HomeController {
        const NAME: &'static str = "Home";

        fn actions(actions: &mut Actions<Self>) {
            actions
                .action("Index", Self::index)
                .action("Details", Self::details)
                .get("/Home/Details/{id}", Self::attribute);
        }
    }

    fn container(services: &ServiceCollection, with_greeter: bool) -> Arc<Container> {
        let mut builder = ContainerBuilder::new();
        builder.bind_controllers(services.controllers());
        builder.bind_method::<RequestContext, _>(|_container: &Container| {
            RequestContext::current()
                .map(Arc::new)
                .ok_or_else(FrameworkError::scope_missing::<RequestContext>)
        });
        if with_greeter {
            builder.bind_constant(Arc::new(Greeter {
                greeting: "hello".to_string(),
            }));
        }
        Arc::new(builder.build())
    }

    fn pipeline(scoping: bool, with_greeter: bool) -> Pipeline {
        let mut services = ServiceCollection::new();
        services.add_controller::<HomeController>();
        if scoping {
            services.add_request_scoping(Scope::new);
        }
        let container = container(&services, with_greeter);

        let mut app = ApplicationBuilder::new(services);
        app.use_mvc(container, |routes| {
            routes.map_route("default", "{controller=Home}/{action=Index}/{id?}")?;
            Ok(())
        })
        .unwrap();
        app.build()
    }

    fn request(method: Method, uri: &str) -> Request {
        Request::new(
            http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_root_goes_to_home_index() {
        let response = pipeline(true, true).handle(Request::get("/")).await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(
            response.json_value(),
            Some(serde_json::json!({"greeting": "hello", "path": "/"}))
        );
    }

    #[tokio::test]
    async fn test_conventional_names_ignore_case() {
        let response = pipeline(true, true)
            .handle(Request::get("/home/details/42"))
            .await;
        // attribute routes are case-sensitive, so the conventional action answers
        assert_eq!(response.json_value(), Some(serde_json::json!({"id": 42})));
    }

    #[tokio::test]
    async fn test_attribute_route_wins() {
        let response = pipeline(true, true)
            .handle(Request::get("/Home/Details/42"))
            .await;
        assert_eq!(response.json_value(), Some(serde_json::json!({"attribute": "42"})));
    }

    #[tokio::test]
    async fn test_unknown_controller_or_action_is_404() {
        let pipeline = pipeline(true, true);
        for uri in ["/Nope", "/Home/Nope", "/Home/Index/1/extra"] {
            let response = pipeline.handle(Request::get(uri)).await;
            assert_eq!(response.status_code(), 404, "{}", uri);
            assert!(response.json_value().unwrap()["error"].is_string());
        }
        let response = pipeline.handle(request(Method::POST, "/Home/Details/x")).await;
        assert_eq!(response.status_code(), 400);
    }

    #[tokio::test]
    async fn test_missing_dependency_is_500() {
        let response = pipeline(true, false).handle(Request::get("/")).await;
        assert_eq!(response.status_code(), 500);
    }

    #[tokio::test]
    async fn test_without_request_scoping_controllers_fail() {
        let response = pipeline(false, true).handle(Request::get("/")).await;
        assert_eq!(response.status_code(), 500);
        assert!(response.json_value().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("no request scope"));
    }

    #[test]
    fn test_malformed_route_template_fails_use_mvc() {
        let services = ServiceCollection::new();
        let container = Arc::new(ContainerBuilder::new().build());
        let mut app = ApplicationBuilder::new(services);

        let result = app.use_mvc(container, |routes| {
            routes.map_route("broken", "{controller")?;
            Ok(())
        });
        assert!(matches!(result, Err(FrameworkError::Configuration(_))));
    }
}
