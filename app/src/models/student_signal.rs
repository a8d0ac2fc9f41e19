use sea_orm::FromQueryResult;
use serde::Serialize;

/// Number of signals of one type sent by one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct StudentSignal {
    pub first_name: String,
    pub last_name: String,
    pub signal_type: i32,
    pub count: i64,
}
