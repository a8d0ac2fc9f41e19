use crate::repositories::StudentSignalsRepository;
use kit::{Actions, Container, Controller, FrameworkError, HttpResponse, Injectable};
use kit::{Request, Response};
use std::sync::Arc;

pub struct StudentSignalsController {
    report: Arc<dyn StudentSignalsRepository>,
}

impl Injectable for StudentSignalsController {
    fn inject(container: &Container) -> Result<Self, FrameworkError> {
        Ok(Self {
            report: container.resolve()?,
        })
    }
}

impl StudentSignalsController {
    pub async fn index(self: Arc<Self>, _req: Request) -> Response {
        let rows = self.report.all().await?;
        Ok(HttpResponse::json_body(&rows)?)
    }
}

impl Controller for StudentSignalsController {
    const NAME: &'static str = "StudentSignals";

    fn actions(actions: &mut Actions<Self>) {
        actions.get("/api/StudentSignalsEndpoint", Self::index);
    }
}
