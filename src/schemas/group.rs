use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::Group;
use crate::db::types::GroupStatus;
use crate::repositories::groups::GroupWithTeacher;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GroupCreate {
    #[serde(alias = "levelId")]
    pub(crate) level_id: String,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "classroomId")]
    pub(crate) classroom_id: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub(crate) code: String,
    #[validate(range(min = 1))]
    pub(crate) capacity: i32,
    #[serde(alias = "startDate")]
    pub(crate) start_date: String,
    #[serde(alias = "endDate")]
    pub(crate) end_date: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupUpdate {
    #[serde(default)]
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "classroomId")]
    pub(crate) classroom_id: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) capacity: Option<i32>,
    #[serde(default)]
    #[serde(alias = "startDate")]
    pub(crate) start_date: Option<String>,
    #[serde(default)]
    #[serde(alias = "endDate")]
    pub(crate) end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupResponse {
    pub(crate) id: String,
    pub(crate) level_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) classroom_id: Option<String>,
    pub(crate) code: String,
    pub(crate) capacity: i32,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) status: GroupStatus,
    pub(crate) created_at: String,
}

impl GroupResponse {
    pub(crate) fn from_db(group: Group) -> Self {
        Self {
            id: group.id,
            level_id: group.level_id,
            teacher_id: group.teacher_id,
            classroom_id: group.classroom_id,
            code: group.code,
            capacity: group.capacity,
            start_date: format_date(group.start_date),
            end_date: format_date(group.end_date),
            status: group.status,
            created_at: format_primitive(group.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupDetailResponse {
    pub(crate) id: String,
    pub(crate) level_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) teacher_name: Option<String>,
    pub(crate) classroom_id: Option<String>,
    pub(crate) code: String,
    pub(crate) capacity: i32,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) status: GroupStatus,
    pub(crate) active_enrollments: i64,
    pub(crate) created_at: String,
}

impl GroupDetailResponse {
    pub(crate) fn from_view(view: GroupWithTeacher, active_enrollments: i64) -> Self {
        let teacher_name = match (&view.teacher_first_name, &view.teacher_last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        };
        Self {
            id: view.id,
            level_id: view.level_id,
            teacher_id: view.teacher_id,
            teacher_name,
            classroom_id: view.classroom_id,
            code: view.code,
            capacity: view.capacity,
            start_date: format_date(view.start_date),
            end_date: format_date(view.end_date),
            status: view.status,
            active_enrollments,
            created_at: format_primitive(view.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CloseGroupResponse {
    pub(crate) group: GroupResponse,
    pub(crate) enrollments_completed: u64,
}
