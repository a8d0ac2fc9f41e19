//! Controllers and MVC dispatch
//!
//! A controller is a request-scoped service that declares its actions once,
//! at registration time. Conventional actions are reached through route
//! templates (`{controller=Home}/{action=Index}/{id?}`); attribute routes bind
//! a fixed method and path (`GET /api/StudentEndpoint/{id}`) to an action.
//!
//! # Example
//!
//! ```rust,ignore
//! pub struct StudentController {
//!     students: Arc<dyn StudentRepository>,
//! }
//!
//! impl Injectable for StudentController {
//!     fn inject(container: &Container) -> Result<Self, FrameworkError> {
//!         Ok(Self { students: container.resolve()? })
//!     }
//! }
//!
//! impl Controller for StudentController {
//!     const NAME: &'static str = "Student";
//!
//!     fn actions(actions: &mut Actions<Self>) {
//!         actions
//!             .action("Index", Self::index)
//!             .get("/api/StudentEndpoint/{id}", Self::show);
//!     }
//! }
//! ```

mod dispatch;

pub use dispatch::{MvcMiddleware, RouteTable};

use crate::container::{ContainerBuilder, Injectable, Lifetime};
use crate::http::{HttpResponse, Request, Response};
use crate::middleware::BoxFuture;
use crate::routing::BoxedHandler;
use http::Method;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A request-scoped service exposing actions
pub trait Controller: Injectable {
    /// Name used by conventional routes, e.g. `Student` for `/Student/Details/1`
    const NAME: &'static str;

    /// Declare the controller's actions and attribute routes
    fn actions(actions: &mut Actions<Self>);
}

/// Wrap a controller method as a handler that resolves the controller first
///
/// The controller is resolved from the request's container, so it shares the
/// request scope with everything else resolved while handling the request.
pub fn action<C, F, Fut>(f: F) -> BoxedHandler
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<Response> {
        match request.resolve::<C>() {
            Ok(controller) => Box::pin(f(controller, request)),
            Err(e) => Box::pin(async move { Err(HttpResponse::from(e)) }),
        }
    })
}

/// Attribute route declared by a controller
pub(crate) struct AttributeRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: BoxedHandler,
}

/// Collects the actions of one controller type
pub struct Actions<C> {
    conventional: Vec<(String, BoxedHandler)>,
    attribute: Vec<AttributeRoute>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> Actions<C> {
    fn new() -> Self {
        Self {
            conventional: Vec::new(),
            attribute: Vec::new(),
            _controller: PhantomData,
        }
    }

    /// Action reachable through conventional routes by `name`
    pub fn action<F, Fut>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.conventional.push((name.to_string(), action::<C, F, Fut>(f)));
        self
    }

    /// Attribute route for `method` and `path`
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.attribute.push(AttributeRoute {
            method,
            path: path.to_string(),
            handler: action::<C, F, Fut>(f),
        });
        self
    }

    pub fn get<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::GET, path, f)
    }

    pub fn post<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::POST, path, f)
    }

    pub fn put<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::PUT, path, f)
    }

    pub fn delete<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::DELETE, path, f)
    }
}

/// Everything the framework knows about one controller type
pub struct ControllerDescriptor {
    pub name: &'static str,
    pub type_name: &'static str,
    /// Registers the controller with the container in request scope
    pub bind: fn(&mut ContainerBuilder),
    /// Lowercased action name -> handler
    actions: HashMap<String, BoxedHandler>,
    attribute_routes: Vec<AttributeRoute>,
}

impl ControllerDescriptor {
    fn of<C: Controller>() -> Self {
        let mut declared = Actions::<C>::new();
        C::actions(&mut declared);

        let actions = declared
            .conventional
            .into_iter()
            .map(|(name, handler)| (name.to_ascii_lowercase(), handler))
            .collect();

        Self {
            name: C::NAME,
            type_name: std::any::type_name::<C>(),
            bind: bind_request_scoped::<C>,
            actions,
            attribute_routes: declared.attribute,
        }
    }

    /// Find a conventional action, ignoring case
    pub fn action(&self, name: &str) -> Option<&BoxedHandler> {
        self.actions.get(&name.to_ascii_lowercase())
    }

    /// Names of the conventional actions
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub(crate) fn attribute_routes(&self) -> &[AttributeRoute] {
        &self.attribute_routes
    }
}

impl std::fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("actions", &self.actions.len())
            .field("attribute_routes", &self.attribute_routes.len())
            .finish()
    }
}

fn bind_request_scoped<C: Controller>(builder: &mut ContainerBuilder) {
    builder.bind_self::<C>(Lifetime::Request);
}

/// The controller types known to the application
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: Vec<Arc<ControllerDescriptor>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller type; a later one with the same name replaces it
    pub fn add<C: Controller>(&mut self) -> &mut Self {
        let descriptor = ControllerDescriptor::of::<C>();
        self.controllers
            .retain(|existing| !existing.name.eq_ignore_ascii_case(descriptor.name));
        self.controllers.push(Arc::new(descriptor));
        self
    }

    /// Find a controller by name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Arc<ControllerDescriptor>> {
        self.controllers
            .iter()
            .find(|descriptor| descriptor.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ControllerDescriptor>> {
        self.controllers.iter()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl Clone for ControllerRegistry {
    fn clone(&self) -> Self {
        Self {
            controllers: self.controllers.clone(),
        }
    }
}
