use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result},
};

use serde::{Deserialize, Serialize};

/// Provider-side identifier of a pre-approved ZNS template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TemplateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Placeholder values sent as `template_data`. Each variant serialises to the
/// flat object the provider expects for that template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemplateFields {
    OrderConfirmation(OrderConfirmationFields),
    TuitionPayment(TuitionPaymentFields),
    Custom(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderConfirmationFields {
    pub order_date: String,
    pub customer_name: String,
    pub order_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuitionPaymentFields {
    pub customer_name: String,
    pub tuition_code: String,
    pub price_number: String,
    pub custom_date: String,
    pub order_code: String,
}
