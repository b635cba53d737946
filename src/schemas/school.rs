use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Agreement, School};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SchoolCreate {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[serde(alias = "sieCode")]
    #[validate(length(min = 1, max = 32))]
    pub(crate) sie_code: String,
    #[serde(default)]
    pub(crate) address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SchoolUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "sieCode")]
    pub(crate) sie_code: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SchoolResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) sie_code: String,
    pub(crate) address: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl SchoolResponse {
    pub(crate) fn from_db(school: School) -> Self {
        Self {
            id: school.id,
            name: school.name,
            sie_code: school.sie_code,
            address: school.address,
            is_active: school.is_active,
            created_at: format_primitive(school.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SchoolDetailResponse {
    #[serde(flatten)]
    pub(crate) school: SchoolResponse,
    pub(crate) agreements: Vec<AgreementResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AgreementCreate {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[serde(alias = "discountPercent")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub(crate) discount_percent: f64,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AgreementUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "discountPercent")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub(crate) discount_percent: Option<f64>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AgreementResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) discount_percent: f64,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl AgreementResponse {
    pub(crate) fn from_db(agreement: Agreement) -> Self {
        Self {
            id: agreement.id,
            name: agreement.name,
            discount_percent: agreement.discount_percent,
            description: agreement.description,
            is_active: agreement.is_active,
            created_at: format_primitive(agreement.created_at),
        }
    }
}
