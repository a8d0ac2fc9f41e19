use kit::{json, Actions, Container, Controller, FrameworkError, Injectable, LoggerFactory};
use kit::{Request, RequestContext, Response};
use std::sync::Arc;

pub struct HomeController {
    loggers: Arc<LoggerFactory>,
    context: Arc<RequestContext>,
}

impl Injectable for HomeController {
    fn inject(container: &Container) -> Result<Self, FrameworkError> {
        Ok(Self {
            loggers: container.resolve()?,
            context: container.resolve()?,
        })
    }
}

impl HomeController {
    /// Service summary
    pub async fn index(self: Arc<Self>, _req: Request) -> Response {
        json(serde_json::json!({
            "application": self.loggers.application(),
            "request_id": self.context.request_id,
            "endpoints": [
                "/api/StudentEndpoint",
                "/api/LessonSignalEndpoint",
                "/api/StudentSignalsEndpoint",
            ],
        }))
    }
}

impl Controller for HomeController {
    const NAME: &'static str = "Home";

    fn actions(actions: &mut Actions<Self>) {
        actions.action("Index", Self::index);
    }
}
