use crate::models::lesson_signal::{SlackMessage, UnknownSignal};
use crate::models::LessonSignalType;
use crate::repositories::LessonSignalRepository;
use kit::{Actions, Container, Controller, FrameworkError, HttpResponse, Injectable};
use kit::{Request, Response};
use std::sync::Arc;

pub struct LessonSignalController {
    signals: Arc<dyn LessonSignalRepository>,
}

impl Injectable for LessonSignalController {
    fn inject(container: &Container) -> Result<Self, FrameworkError> {
        Ok(Self {
            signals: container.resolve()?,
        })
    }
}

impl LessonSignalController {
    pub async fn index(self: Arc<Self>, _req: Request) -> Response {
        let signals = self.signals.all().await?;
        Ok(HttpResponse::json_body(&signals)?)
    }

    pub async fn show(self: Arc<Self>, req: Request) -> Response {
        let id: i32 = req.param_as("id")?;
        let signal = self
            .signals
            .find(id)
            .await?
            .ok_or_else(|| FrameworkError::model_not_found("Lesson signal"))?;
        Ok(HttpResponse::json_body(&signal)?)
    }

    /// Chat integration posts `user_id` and `text` as a form
    pub async fn store(self: Arc<Self>, req: Request) -> Response {
        let message: SlackMessage = req.input()?;
        let signal_type: LessonSignalType = message
            .text
            .parse()
            .map_err(|e: UnknownSignal| FrameworkError::bad_request(e.to_string()))?;

        self.signals.create(message.user_id.trim(), signal_type).await?;
        Ok(HttpResponse::new().status(202))
    }

    pub async fn destroy(self: Arc<Self>, req: Request) -> Response {
        let id: i32 = req.param_as("id")?;
        self.signals.delete(id).await?;
        Ok(HttpResponse::new().status(202))
    }
}

impl Controller for LessonSignalController {
    const NAME: &'static str = "LessonSignal";

    fn actions(actions: &mut Actions<Self>) {
        actions
            .get("/api/LessonSignalEndpoint", Self::index)
            .get("/api/LessonSignalEndpoint/{id}", Self::show)
            .post("/api/LessonSignalEndpoint", Self::store)
            .delete("/api/LessonSignalEndpoint/{id}", Self::destroy);
    }
}
