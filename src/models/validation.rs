use anyhow::{Result, anyhow};

use crate::models::customer::Customer;

pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Err(anyhow!("Phone number cannot be empty"));
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("Phone number contains invalid characters"));
    }

    if digits.len() < 9 {
        return Err(anyhow!("Phone number too short (minimum 9 digits)"));
    }

    if digits.len() > 15 {
        return Err(anyhow!("Phone number too long (maximum 15 digits)"));
    }

    Ok(())
}

pub fn validate_customer(customer: &Customer) -> Result<()> {
    if customer.name.trim().is_empty() {
        return Err(anyhow!("Customer name cannot be empty"));
    }

    validate_phone(&customer.phone)
        .map_err(|e| anyhow!("Invalid phone for customer '{}': {}", customer.name, e))
}
