//! Students
//!
//! A student is identified in chat by `user_id`.

pub use super::entities::student::*;

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::Deserialize;

pub type Student = Model;

impl ActiveModelBehavior for ActiveModel {}

/// Body of create and update requests
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    pub user_id: String,
}

impl StudentInput {
    /// Trimmed copy; fails when a field is blank
    pub fn normalized(self) -> Result<Self, &'static str> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let user_id = self.user_id.trim().to_string();
        if first_name.is_empty() {
            return Err("first_name");
        }
        if last_name.is_empty() {
            return Err("last_name");
        }
        if user_id.is_empty() {
            return Err("user_id");
        }
        Ok(Self {
            first_name,
            last_name,
            user_id,
        })
    }

    pub fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            user_id: Set(self.user_id),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_and_rejects_blank() {
        let input = StudentInput {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            user_id: "U1\n".to_string(),
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.first_name, "Ada");
        assert_eq!(normalized.user_id, "U1");

        let blank = StudentInput {
            first_name: "Ada".to_string(),
            last_name: "  ".to_string(),
            user_id: "U1".to_string(),
        };
        assert_eq!(blank.normalized(), Err("last_name"));
    }
}
