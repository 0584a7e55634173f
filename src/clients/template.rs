use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

use tracing::{debug, error};

use crate::{
    error::DispatchError,
    models::{
        customer::Customer,
        template::{OrderConfirmationFields, TemplateFields, TemplateId, TuitionPaymentFields},
    },
};

pub const ORDER_CONFIRMATION_TEMPLATE: &str = "366532";
pub const TUITION_PAYMENT_TEMPLATE: &str = "366485";

// Placeholders used until the customer record carries the real values.
const DEFAULT_ORDER_DATE: &str = "20/03/2020";
const DEFAULT_ORDER_CODE: &str = "PE010299485";
const DEFAULT_TUITION_CODE: &str = "PE010299485";
const DEFAULT_TUITION_ORDER_CODE: &str = "PE010299cv485";
const DEFAULT_PRICE_NUMBER: &str = "1000";

pub type ResolveFn = Arc<dyn Fn(&Customer) -> TemplateFields + Send + Sync>;

/// Maps template ids to the function that builds their `template_data`.
#[derive(Clone, Default)]
pub struct TemplateResolver {
    resolvers: HashMap<TemplateId, ResolveFn>,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_templates() -> Self {
        let mut resolver = Self::new();
        resolver.register(ORDER_CONFIRMATION_TEMPLATE.into(), order_confirmation);
        resolver.register(TUITION_PAYMENT_TEMPLATE.into(), tuition_payment);
        resolver
    }

    /// Registers or replaces the resolver for `template_id`.
    pub fn register<F>(&mut self, template_id: TemplateId, resolve: F)
    where
        F: Fn(&Customer) -> TemplateFields + Send + Sync + 'static,
    {
        debug!(template_id = %template_id, "Template resolver registered");
        self.resolvers.insert(template_id, Arc::new(resolve));
    }

    pub fn contains(&self, template_id: &TemplateId) -> bool {
        self.resolvers.contains_key(template_id)
    }

    pub fn template_ids(&self) -> Vec<TemplateId> {
        let mut ids: Vec<TemplateId> = self.resolvers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn resolve(
        &self,
        template_id: &TemplateId,
        customer: &Customer,
    ) -> Result<TemplateFields, DispatchError> {
        match self.resolvers.get(template_id) {
            Some(resolve) => Ok(resolve(customer)),
            None => {
                error!(
                    template_id = %template_id,
                    phone = %customer.phone,
                    "No resolver registered for template"
                );
                Err(DispatchError::UnknownTemplate(template_id.clone()))
            }
        }
    }
}

impl Debug for TemplateResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResolver")
            .field("templates", &self.template_ids())
            .finish()
    }
}

fn field_or(customer: &Customer, key: &str, default: &str) -> String {
    customer.field(key).unwrap_or_else(|| default.to_string())
}

fn order_confirmation(customer: &Customer) -> TemplateFields {
    TemplateFields::OrderConfirmation(OrderConfirmationFields {
        order_date: field_or(customer, "order_date", DEFAULT_ORDER_DATE),
        customer_name: customer.name.clone(),
        order_code: field_or(customer, "order_code", DEFAULT_ORDER_CODE),
    })
}

fn tuition_payment(customer: &Customer) -> TemplateFields {
    TemplateFields::TuitionPayment(TuitionPaymentFields {
        customer_name: customer.name.clone(),
        tuition_code: field_or(customer, "tuition_code", DEFAULT_TUITION_CODE),
        price_number: field_or(customer, "price_number", DEFAULT_PRICE_NUMBER),
        custom_date: field_or(customer, "custom_date", DEFAULT_ORDER_DATE),
        order_code: field_or(customer, "order_code", DEFAULT_TUITION_ORDER_CODE),
    })
}
