//! Field constraints applied to request bodies before anything reaches storage.

use std::collections::HashMap;
use uuid::Uuid;

use super::error::CatalogError;

/// Inclusive bounds on a name, counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub min: usize,
    pub max: Option<usize>,
}

impl NameRule {
    pub const fn min(min: usize) -> Self {
        Self { min, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }
}

/// Parse an identifier taken from a path segment or a body field.
pub fn parse_identifier(field: &str, raw: &str) -> Result<Uuid, CatalogError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CatalogError::invalid_identifier(field, raw))
}

/// Collects every field violation of a body so the client sees them all at once.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn name(&mut self, field: &str, value: Option<&str>, rule: NameRule) -> String {
        let Some(value) = value else {
            self.add(field, "This field is required");
            return String::new();
        };

        let len = value.chars().count();
        if len < rule.min {
            self.add(field, format!("Must be at least {} characters", rule.min));
        } else if let Some(max) = rule.max.filter(|max| len > *max) {
            self.add(field, format!("Must be at most {} characters", max));
        }
        value.to_string()
    }

    /// A required reference to another entity. A malformed value fails fast as an
    /// invalid identifier; absence is recorded and the nil id stands in until `finish`.
    pub fn reference(&mut self, field: &str, raw: Option<&str>) -> Result<Uuid, CatalogError> {
        match raw {
            Some(raw) => parse_identifier(field, raw),
            None => {
                self.add(field, "This field is required");
                Ok(Uuid::nil())
            }
        }
    }

    pub fn nutrient(&mut self, field: &str, value: f64) -> f64 {
        if !value.is_finite() {
            self.add(field, "Must be a finite number");
        } else if value < 0.0 {
            self.add(field, "Must not be negative");
        }
        value
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish<T>(self, value: T) -> Result<T, CatalogError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(CatalogError::validation_failed(self.0))
        }
    }
}
