use crate::models::StudentInput;
use crate::repositories::StudentRepository;
use kit::{Actions, Container, Controller, FrameworkError, HttpResponse, Injectable, Logger};
use kit::{LoggerFactory, Request, Response};
use serde::Deserialize;
use std::sync::Arc;

pub struct StudentController {
    students: Arc<dyn StudentRepository>,
    logger: Logger,
}

impl Injectable for StudentController {
    fn inject(container: &Container) -> Result<Self, FrameworkError> {
        let loggers = container.resolve::<LoggerFactory>()?;
        Ok(Self {
            students: container.resolve()?,
            logger: loggers.logger_for::<Self>(),
        })
    }
}

/// Update body: the student's id travels with the fields
#[derive(Debug, Deserialize)]
struct StudentUpdate {
    id: i32,
    #[serde(flatten)]
    fields: StudentInput,
}

impl StudentController {
    pub async fn index(self: Arc<Self>, _req: Request) -> Response {
        let students = self.students.all().await?;
        Ok(HttpResponse::json_body(&students)?)
    }

    pub async fn show(self: Arc<Self>, req: Request) -> Response {
        let id: i32 = req.param_as("id")?;
        let student = self
            .students
            .find(id)
            .await?
            .ok_or_else(|| FrameworkError::model_not_found("Student"))?;
        Ok(HttpResponse::json_body(&student)?)
    }

    pub async fn store(self: Arc<Self>, req: Request) -> Response {
        let input: StudentInput = req.input()?;
        let student = self.students.create(input).await?;
        self.logger.info(format!("created student {}", student.id));
        Ok(HttpResponse::json_body(&student)?
            .status(201)
            .header("Location", format!("/api/StudentEndpoint/{}", student.id)))
    }

    pub async fn update(self: Arc<Self>, req: Request) -> Response {
        let body: StudentUpdate = req.input()?;
        let student = self.students.update(body.id, body.fields).await?;
        Ok(HttpResponse::json_body(&student)?)
    }

    pub async fn destroy(self: Arc<Self>, req: Request) -> Response {
        let id: i32 = req.param_as("id")?;
        self.students.delete(id).await?;
        self.logger.info(format!("deleted student {}", id));
        Ok(HttpResponse::new().status(202))
    }
}

impl Controller for StudentController {
    const NAME: &'static str = "Student";

    fn actions(actions: &mut Actions<Self>) {
        actions
            .action("Index", Self::index)
            .action("Details", Self::show)
            .get("/api/StudentEndpoint", Self::index)
            .get("/api/StudentEndpoint/{id}", Self::show)
            .post("/api/StudentEndpoint", Self::store)
            .put("/api/StudentEndpoint", Self::update)
            .delete("/api/StudentEndpoint/{id}", Self::destroy);
    }
}
