//! Payment intent builder
//!
//! Validates the payment dialog against the selected line item. Every failing
//! field is reported, not just the first one.

use crate::channels::ChannelRegistry;
use crate::types::{ChannelId, PaymentIntent, RawPaymentForm};
use debt_core::config::PaymentConfig;
use debt_core::{DebtLineItem, Field, ValidationError, ValidationErrors};
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ()\-]*$";

/// Builds validated [`PaymentIntent`]s
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    channels: ChannelRegistry,
    min_phone_len: usize,
    email_regex: Regex,
    phone_regex: Regex,
}

impl IntentBuilder {
    /// Create new builder
    pub fn new(channels: ChannelRegistry, min_phone_len: usize) -> Self {
        Self {
            channels,
            min_phone_len,
            email_regex: Regex::new(EMAIL_PATTERN).expect("email pattern compiles"),
            phone_regex: Regex::new(PHONE_PATTERN).expect("phone pattern compiles"),
        }
    }

    /// Builder for the `payment` config section
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            ChannelRegistry::from_config(&config.channels),
            config.min_phone_len,
        )
    }

    /// Registered channels
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Validate `form` and freeze the amount due on `item`
    pub fn build(
        &self,
        item: &DebtLineItem,
        form: &RawPaymentForm,
    ) -> Result<PaymentIntent, ValidationErrors> {
        let mut errors = Vec::new();

        if !item.is_payable() {
            errors.push(ValidationError::ItemNotPayable(item.id.to_string()));
        }

        let channel = form.channel.trim();
        if channel.is_empty() {
            errors.push(ValidationError::Required(Field::Channel));
        } else if !self.channels.contains(channel) {
            errors.push(ValidationError::UnknownChannel(channel.to_string()));
        }

        let phone = form.contact_phone.trim();
        if phone.is_empty() {
            errors.push(ValidationError::Required(Field::ContactPhone));
        } else if !self.phone_regex.is_match(phone) {
            errors.push(ValidationError::invalid(
                Field::ContactPhone,
                "must be a phone number",
            ));
        } else if phone.chars().filter(char::is_ascii_digit).count() < self.min_phone_len {
            // Separators do not count toward the length
            errors.push(ValidationError::invalid(
                Field::ContactPhone,
                format!("must contain at least {} digits", self.min_phone_len),
            ));
        }

        let email = form
            .contact_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());
        if let Some(email) = email {
            if !self.email_regex.is_match(email) {
                errors.push(ValidationError::invalid(
                    Field::ContactEmail,
                    "must be a valid email address",
                ));
            }
        }

        if !form.consent_given {
            errors.push(ValidationError::ConsentRequired);
        }

        ValidationErrors::check(errors)?;

        Ok(PaymentIntent::new(
            item.id.clone(),
            ChannelId::new(channel),
            phone.to_string(),
            email.map(str::to_string),
            item.amount_due(),
        ))
    }
}

impl Default for IntentBuilder {
    fn default() -> Self {
        Self::from_config(&PaymentConfig::default())
    }
}
