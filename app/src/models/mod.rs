pub mod entities;
pub mod lesson_signal;
pub mod student;
pub mod student_signal;

pub use lesson_signal::LessonSignalType;
pub use student::StudentInput;
pub use student_signal::StudentSignal;
