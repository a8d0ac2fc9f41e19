use super::ControllerRegistry;
use crate::container::Container;
use crate::error::FrameworkError;
use crate::http::{Request, Response};
use crate::middleware::{Middleware, Next};
use crate::routing::{RouteTemplate, RouteTemplateError, Router};
use async_trait::async_trait;
use std::sync::Arc;

/// Conventional routes, tried in registration order
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<(String, RouteTemplate)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named conventional route, e.g.
    /// `map_route("default", "{controller=Home}/{action=Index}/{id?}")`
    pub fn map_route(&mut self, name: &str, template: &str) -> Result<&mut Self, RouteTemplateError> {
        let template = RouteTemplate::parse(template)?;
        self.routes.push((name.to_string(), template));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteTemplate)> {
        self.routes.iter().map(|(name, template)| (name.as_str(), template))
    }
}

/// Dispatches requests to controller actions
///
/// Attribute routes are tried first, then the conventional routes. A request
/// matching neither is passed on.
pub struct MvcMiddleware {
    container: Arc<Container>,
    controllers: ControllerRegistry,
    attribute_routes: Router,
    routes: RouteTable,
}

impl MvcMiddleware {
    pub fn new(
        container: Arc<Container>,
        controllers: ControllerRegistry,
        routes: RouteTable,
    ) -> Result<Self, FrameworkError> {
        let mut attribute_routes = Router::new();
        for descriptor in controllers.iter() {
            for route in descriptor.attribute_routes() {
                attribute_routes.insert(route.method.clone(), &route.path, route.handler.clone());
            }
        }
        if let Some(e) = attribute_routes.take_error() {
            return Err(FrameworkError::Configuration(e.to_string()));
        }

        tracing::debug!(
            controllers = controllers.len(),
            attribute_routes = attribute_routes.len(),
            conventional_routes = routes.len(),
            "mvc configured"
        );

        Ok(Self {
            container,
            controllers,
            attribute_routes,
            routes,
        })
    }

    fn dispatch(&self, request: Request) -> Result<crate::middleware::BoxFuture<Response>, Request> {
        if let Some((handler, params)) = self
            .attribute_routes
            .match_route(request.method(), request.path())
        {
            let request = request
                .with_params(params)
                .with_services(self.container.clone());
            return Ok(handler(request));
        }

        for (name, template) in self.routes.iter() {
            let values = match template.match_path(request.path()) {
                Some(values) => values,
                None => continue,
            };
            let handler = values
                .get("controller")
                .and_then(|controller| self.controllers.find(controller))
                .and_then(|descriptor| descriptor.action(values.get("action")?));

            if let Some(handler) = handler {
                tracing::trace!(route = name, path = request.path(), "conventional route matched");
                let request = request
                    .with_params(values.into_map())
                    .with_services(self.container.clone());
                return Ok(handler(request));
            }
        }

        Err(request)
    }
}

#[async_trait]
impl Middleware for MvcMiddleware {
    async fn handle(&self, request: Request, next: Next) -> Response {
        match self.dispatch(request) {
            Ok(action) => action.await,
            Err(request) => next(request).await,
        }
    }
}
