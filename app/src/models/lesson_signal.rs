//! Lesson signals sent by students from chat

pub use super::entities::lesson_signal::*;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

impl ActiveModelBehavior for ActiveModel {}

/// How the student feels about the lesson
///
/// Stored and serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LessonSignalType {
    BoringSimple = -1,
    Simple = 0,
    InterestingSimple = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal '{0}', expected boring, simple or interesting")]
pub struct UnknownSignal(pub String);

impl LessonSignalType {
    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::BoringSimple),
            0 => Some(Self::Simple),
            1 => Some(Self::InterestingSimple),
            _ => None,
        }
    }
}

/// Parses the chat text of a signal
impl FromStr for LessonSignalType {
    type Err = UnknownSignal;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "boring" => Ok(Self::BoringSimple),
            "simple" => Ok(Self::Simple),
            "interesting" => Ok(Self::InterestingSimple),
            _ => Err(UnknownSignal(text.trim().to_string())),
        }
    }
}

impl Serialize for LessonSignalType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for LessonSignalType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        Self::from_value(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid signal type {}", value)))
    }
}

/// A signal together with the chat user who sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSignalDto {
    pub id: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub signal_type: LessonSignalType,
    pub user_id: String,
}

impl LessonSignalDto {
    /// Join a stored signal with its student's chat id
    ///
    /// Stored values outside the known range read as `Simple`.
    pub fn from_parts(signal: Model, user_id: String) -> Self {
        Self {
            id: signal.id,
            timestamp: signal.timestamp,
            signal_type: LessonSignalType::from_value(signal.signal_type)
                .unwrap_or(LessonSignalType::Simple),
            user_id,
        }
    }
}

/// Form posted by the chat integration
#[derive(Debug, Clone, Deserialize)]
pub struct SlackMessage {
    pub user_id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_text() {
        assert_eq!(" Boring ".parse(), Ok(LessonSignalType::BoringSimple));
        assert_eq!("simple".parse(), Ok(LessonSignalType::Simple));
        assert_eq!("INTERESTING\n".parse(), Ok(LessonSignalType::InterestingSimple));
        assert_eq!(
            "meh".parse::<LessonSignalType>(),
            Err(UnknownSignal("meh".to_string()))
        );
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&LessonSignalType::BoringSimple).unwrap(), "-1");
        assert_eq!(
            serde_json::from_str::<LessonSignalType>("1").unwrap(),
            LessonSignalType::InterestingSimple
        );
        assert!(serde_json::from_str::<LessonSignalType>("7").is_err());
    }

    #[test]
    fn test_dto_uses_type_field() {
        let signal = Model {
            id: 3,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            signal_type: 1,
            student_id: 9,
        };
        let dto = LessonSignalDto::from_parts(signal, "U9".to_string());
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["type"], 1);
        assert_eq!(json["user_id"], "U9");
        assert_eq!(json["id"], 3);
    }
}
