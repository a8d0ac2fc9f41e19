pub mod config;
pub mod container;
pub mod database;
pub mod error;
pub mod hosting;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod mvc;
pub mod pipeline;
pub mod routing;
pub mod server;

pub use config::{ConfigError, Configuration, ConfigurationBuilder, Environment, ServerConfig};
pub use container::{Container, ContainerBuilder, Injectable, Lifetime, Scope, ScopeFactory};
pub use database::{DatabaseConfig, DbConnection};
pub use error::FrameworkError;
pub use hosting::{HostingEnvironment, Startup, WebHost};
pub use http::{json, text, HttpResponse, Request, RequestContext, Response, ResponseExt};
pub use logging::{Logger, LoggerFactory};
pub use middleware::{Middleware, Next};
pub use mvc::{Actions, Controller, ControllerRegistry, RouteTable};
pub use pipeline::{ApplicationBuilder, Pipeline, ServiceCollection};
pub use routing::{RouteTemplate, Router};
pub use server::Server;

pub use async_trait::async_trait;
