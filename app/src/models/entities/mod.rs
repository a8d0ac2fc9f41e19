//! Table definitions
//!
//! Custom behaviour lives next door in `models/`; these files only describe
//! the tables.

pub mod lesson_signal;
pub mod student;
