use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod attendance;
pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod enrollment;
pub(crate) mod grade;
pub(crate) mod group;
pub(crate) mod notification;
pub(crate) mod people;
pub(crate) mod school;
pub(crate) mod settings;
pub(crate) mod stats;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) docs_url: String,
}
