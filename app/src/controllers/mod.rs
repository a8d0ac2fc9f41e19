pub mod home;
pub mod lesson_signal;
pub mod student;
pub mod student_signals;

pub use home::HomeController;
pub use lesson_signal::LessonSignalController;
pub use student::StudentController;
pub use student_signals::StudentSignalsController;

use kit::ServiceCollection;

/// Register every controller for MVC dispatch
pub fn register(services: &mut ServiceCollection) {
    services
        .add_controller::<HomeController>()
        .add_controller::<StudentController>()
        .add_controller::<LessonSignalController>()
        .add_controller::<StudentSignalsController>();
}
