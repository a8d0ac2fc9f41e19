//! Composition root
//!
//! Loads the layered configuration, builds the three repositories once over a
//! shared connection, and wires controllers, framework services and
//! repositories into the container.

use crate::controllers;
use crate::repositories::{
    self, LessonSignalRepository, SqlLessonSignalRepository, SqlStudentRepository,
    SqlStudentSignalsRepository, StudentRepository, StudentSignalsRepository,
};
use kit::config::ConfigError;
use kit::{async_trait, ApplicationBuilder, Configuration, Container, ContainerBuilder};
use kit::{ControllerRegistry, FrameworkError, HostingEnvironment, LoggerFactory, RequestContext};
use kit::{Scope, ServiceCollection, Startup};
use std::sync::Arc;

/// Conventional route for controllers without attribute routes
pub const DEFAULT_ROUTE: &str = "{controller=Home}/{action=Index}/{id?}";

/// Read, in increasing precedence: `appsettings.json`,
/// `appsettings.{Environment}.json` (optional), `appsettings.Db.json` and the
/// process environment
pub fn load_configuration(env: &HostingEnvironment) -> Result<Configuration, ConfigError> {
    Configuration::builder()
        .set_base_path(&env.content_root)
        .add_json_file("appsettings.json", false)
        .add_json_file(format!("appsettings.{}.json", env.environment_name()), true)
        .add_json_file("appsettings.Db.json", false)
        .add_environment_variables()
        .build()
}

pub struct AppStartup {
    configuration: Arc<Configuration>,
    students: Arc<dyn StudentRepository>,
    lesson_signals: Arc<dyn LessonSignalRepository>,
    student_signals: Arc<dyn StudentSignalsRepository>,
}

impl AppStartup {
    fn register_application_components(
        &self,
        controllers: &ControllerRegistry,
        loggers: &LoggerFactory,
    ) -> Container {
        let mut builder = ContainerBuilder::new();

        builder.bind_controllers(controllers);

        // framework-owned, read from the current request scope
        builder.bind_method::<RequestContext, _>(|_container: &Container| {
            RequestContext::current()
                .map(Arc::new)
                .ok_or_else(FrameworkError::scope_missing::<RequestContext>)
        });
        builder.bind_constant(Arc::new(loggers.clone()));

        builder
            .bind_constant(self.configuration.clone())
            .bind_constant::<dyn StudentRepository>(self.students.clone())
            .bind_constant::<dyn LessonSignalRepository>(self.lesson_signals.clone())
            .bind_constant::<dyn StudentSignalsRepository>(self.student_signals.clone());

        builder.build()
    }
}

#[async_trait]
impl Startup for AppStartup {
    async fn new(env: &HostingEnvironment) -> Result<Self, FrameworkError> {
        let configuration = load_configuration(env)?;
        tracing::info!(keys = configuration.len(), environment = %env.environment, "configuration loaded");

        let conn = repositories::connect(&configuration, &env.content_root).await?;

        Ok(Self {
            configuration: Arc::new(configuration),
            students: Arc::new(SqlStudentRepository::from_connection(conn.clone())),
            lesson_signals: Arc::new(SqlLessonSignalRepository::from_connection(conn.clone())),
            student_signals: Arc::new(SqlStudentSignalsRepository::from_connection(conn)),
        })
    }

    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configure_services(&mut self, services: &mut ServiceCollection) {
        controllers::register(services);
        services.add_request_scoping(Scope::new);
    }

    fn configure(
        &mut self,
        app: &mut ApplicationBuilder,
        env: &HostingEnvironment,
        loggers: &LoggerFactory,
    ) -> Result<(), FrameworkError> {
        let container = Arc::new(self.register_application_components(app.controllers(), loggers));
        loggers
            .create_logger("Startup")
            .info(format!("container built with {} bindings", container.len()));

        app.use_static_files(env.web_root.clone());
        app.use_mvc(container, |routes| {
            routes.map_route("default", DEFAULT_ROUTE)?;
            Ok(())
        })?;
        Ok(())
    }
}
