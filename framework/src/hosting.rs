//! Hosting: environment, startup contract and the web host
//!
//! The [`WebHost`] drives an application's [`Startup`] in a fixed order:
//!
//! 1. `Startup::new` loads configuration and builds long-lived services
//! 2. `configure_services` registers controllers and request scoping
//! 3. `configure` builds the container and adds middleware
//!
//! and then serves the resulting pipeline.

use crate::config::{load_dotenv, Configuration, Environment, ServerConfig};
use crate::error::FrameworkError;
use crate::logging::LoggerFactory;
use crate::pipeline::{ApplicationBuilder, Pipeline, ServiceCollection};
use crate::server::Server;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Directory under the content root holding static files
pub const WEB_ROOT_DIR: &str = "wwwroot";

/// Where and as what the application runs
#[derive(Debug, Clone, PartialEq)]
pub struct HostingEnvironment {
    pub application_name: String,
    pub environment: Environment,
    /// Directory holding the settings files
    pub content_root: PathBuf,
    /// Static files, `content_root/wwwroot`
    pub web_root: PathBuf,
}

impl HostingEnvironment {
    pub fn new(
        application_name: impl Into<String>,
        environment: Environment,
        content_root: impl Into<PathBuf>,
    ) -> Self {
        let content_root = content_root.into();
        Self {
            application_name: application_name.into(),
            environment,
            web_root: content_root.join(WEB_ROOT_DIR),
            content_root,
        }
    }

    /// Resolve from the process: `.env` files in `content_root` are loaded
    /// first, then the environment is read from `APP_ENV`
    pub fn detect(application_name: impl Into<String>, content_root: &Path) -> Self {
        let loaded = load_dotenv(content_root);
        let env = Self::new(application_name, Environment::detect(), content_root);
        tracing::debug!(
            environment = %env.environment,
            content_root = %env.content_root.display(),
            dotenv_files = loaded,
            "hosting environment resolved"
        );
        env
    }

    /// Name of the environment as used in settings file names
    pub fn environment_name(&self) -> &str {
        self.environment.name()
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// The composition root of an application
#[async_trait]
pub trait Startup: Send + Sized + 'static {
    /// Load configuration and build the services that live for the whole process
    async fn new(env: &HostingEnvironment) -> Result<Self, FrameworkError>;

    /// The merged configuration
    fn configuration(&self) -> &Configuration;

    /// Register controllers and framework services
    fn configure_services(&mut self, services: &mut ServiceCollection);

    /// Build the container and the request pipeline
    fn configure(
        &mut self,
        app: &mut ApplicationBuilder,
        env: &HostingEnvironment,
        loggers: &LoggerFactory,
    ) -> Result<(), FrameworkError>;
}

/// Runs a [`Startup`] and serves it
pub struct WebHost {
    env: HostingEnvironment,
    host: Option<String>,
    port: Option<u16>,
}

impl WebHost {
    pub fn new(env: HostingEnvironment) -> Self {
        Self {
            env,
            host: None,
            port: None,
        }
    }

    /// Override `Server:Host`
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override `Server:Port`
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn environment(&self) -> &HostingEnvironment {
        &self.env
    }

    /// Run the startup sequence without serving
    pub async fn build<S: Startup>(&self) -> Result<(Pipeline, ServerConfig), FrameworkError> {
        let mut startup = S::new(&self.env).await?;

        let mut services = ServiceCollection::new();
        startup.configure_services(&mut services);
        tracing::debug!(
            controllers = services.controllers().len(),
            request_scoping = services.has_request_scoping(),
            "services configured"
        );

        let loggers = LoggerFactory::new(self.env.application_name.clone());
        let mut app = ApplicationBuilder::new(services);
        startup.configure(&mut app, &self.env, &loggers)?;

        let mut server = ServerConfig::builder().base(ServerConfig::from_configuration(startup.configuration()));
        if let Some(host) = &self.host {
            server = server.host(host.clone());
        }
        if let Some(port) = self.port {
            server = server.port(port);
        }

        Ok((app.build(), server.build()))
    }

    /// Run the startup sequence and serve until Ctrl-C
    pub async fn run<S: Startup>(self) -> Result<(), FrameworkError> {
        let (pipeline, config) = self.build::<S>().await?;
        tracing::info!(
            application = %self.env.application_name,
            environment = %self.env.environment,
            "starting"
        );

        Server::new(pipeline, config)
            .run()
            .await
            .map_err(|e| FrameworkError::internal(e.to_string()))
    }
}
