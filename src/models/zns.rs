use serde::{Deserialize, Serialize};

use crate::models::template::{TemplateFields, TemplateId};

#[derive(Debug, Clone, Serialize)]
pub struct ZnsRequest {
    pub phone: String,
    pub template_id: TemplateId,
    pub template_data: TemplateFields,
    pub tracking_id: String,
}

/// Body returned by the template-message endpoint. `error == 0` is the only
/// success signal; the HTTP status alone is not enough.
#[derive(Debug, Clone, Deserialize)]
pub struct ZnsResponse {
    pub error: i64,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<ZnsResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZnsResponseData {
    #[serde(default)]
    pub msg_id: Option<String>,
}

impl ZnsResponse {
    pub fn is_success(&self) -> bool {
        self.error == 0
    }
}
