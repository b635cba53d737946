use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "rolename", rename_all = "snake_case")]
pub(crate) enum RoleName {
    Admin,
    Teacher,
    Student,
    LegalGuardian,
}

impl RoleName {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::Teacher => "TEACHER",
            RoleName::Student => "STUDENT",
            RoleName::LegalGuardian => "LEGAL_GUARDIAN",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(RoleName::Admin),
            "TEACHER" => Some(RoleName::Teacher),
            "STUDENT" => Some(RoleName::Student),
            "LEGAL_GUARDIAN" | "GUARDIAN" => Some(RoleName::LegalGuardian),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "groupstatus", rename_all = "snake_case")]
pub(crate) enum GroupStatus {
    Active,
    GradesSubmitted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "enrollmentstatus", rename_all = "snake_case")]
pub(crate) enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "attendancestatus", rename_all = "snake_case")]
pub(crate) enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "notificationkind", rename_all = "lowercase")]
pub(crate) enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_parse_accepts_spec_spelling() {
        assert_eq!(RoleName::parse("ADMIN"), Some(RoleName::Admin));
        assert_eq!(RoleName::parse("legal_guardian"), Some(RoleName::LegalGuardian));
        assert_eq!(RoleName::parse("GUARDIAN"), Some(RoleName::LegalGuardian));
        assert_eq!(RoleName::parse("janitor"), None);
    }

    #[test]
    fn status_serde_uses_upper_snake() {
        let json = serde_json::to_string(&GroupStatus::GradesSubmitted).unwrap();
        assert_eq!(json, "\"GRADES_SUBMITTED\"");
        let back: GroupStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(back, GroupStatus::Completed);
    }
}
