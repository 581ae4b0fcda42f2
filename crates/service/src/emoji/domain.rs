use configs::DatabaseConfig;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::permission::PermissionRequest;

/// Icon fields supplied by callers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IconInput {
    #[serde(rename = "htmlCode")]
    #[validate(length(min = 1, max = 6, message = "htmlCode should not be empty and fit in 6 characters"))]
    pub html_code: String,
    #[validate(length(min = 1, message = "name should not be empty"))]
    pub name: String,
}

/// `create_new_emoji` payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmojiRequest {
    #[validate(nested)]
    pub data: IconInput,
    pub applicant: String,
    pub recipient: String,
}

impl CreateEmojiRequest {
    pub fn permission(&self) -> PermissionRequest<'_> {
        PermissionRequest { applicant: &self.applicant, recipient: &self.recipient }
    }
}

/// Delete payload. The service accepts it, no dispatch route produces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEmojiRequest {
    pub id: i32,
    pub applicant: String,
    pub recipient: String,
}

impl DeleteEmojiRequest {
    pub fn permission(&self) -> PermissionRequest<'_> {
        PermissionRequest { applicant: &self.applicant, recipient: &self.recipient }
    }
}

/// `get_one` payload. Wider than the column so any integer id decodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetOneRequest {
    pub id: i64,
}

/// Static description of the backing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub database_name: String,
    pub database_type: String,
}

impl DatabaseInfo {
    /// `None` when either the name or the backend cannot be determined.
    pub fn from_config(cfg: &DatabaseConfig) -> Option<Self> {
        let database_type = cfg.backend()?.as_str().to_string();
        let database_name = cfg.database_name()?;
        Some(Self { database_name, database_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(html_code: &str, name: &str) -> IconInput {
        IconInput { html_code: html_code.into(), name: name.into() }
    }

    #[test]
    fn icon_input_requires_non_empty_fields() {
        assert!(input("1F600", "grin").validate().is_ok());
        assert!(input("", "grin").validate().is_err());
        assert!(input("1F600", "").validate().is_err());
        assert!(input("1F600AB", "grin").validate().is_err());
    }

    #[test]
    fn create_request_validates_nested_data() {
        let req = CreateEmojiRequest { data: input("", ""), applicant: "a".into(), recipient: "r".into() };
        let errs = req.validate().unwrap_err();
        assert!(errs.errors().contains_key("data"));
    }

    #[test]
    fn create_request_reads_camel_case_payload() {
        let req: CreateEmojiRequest = serde_json::from_value(serde_json::json!({
            "data": {"htmlCode": "1F600", "name": "grin"},
            "applicant": "dashboard_queue-1",
            "recipient": "core_queue-2"
        }))
        .unwrap();
        assert_eq!(req.data.html_code, "1F600");
        assert_eq!(req.permission().recipient, "core_queue-2");
    }

    #[test]
    fn database_info_from_config() {
        let cfg = DatabaseConfig { url: "mysql://root@localhost:3306/emoji".into(), ..DatabaseConfig::default() };
        assert_eq!(
            DatabaseInfo::from_config(&cfg),
            Some(DatabaseInfo { database_name: "emoji".into(), database_type: "mysql".into() })
        );
        assert_eq!(DatabaseInfo::from_config(&DatabaseConfig::default()), None);
    }
}
