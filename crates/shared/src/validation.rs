use serde::{Deserialize, Serialize};

use crate::domain::Owner;

const MAX_TELEPHONE_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Outcome of binding and validating a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingResult {
    errors: Vec<FieldError>,
}

impl BindingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_value(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }
}

pub fn validate_owner(owner: &Owner) -> BindingResult {
    let mut result = BindingResult::new();

    for (field, value) in [
        ("firstName", &owner.first_name),
        ("lastName", &owner.last_name),
        ("address", &owner.address),
        ("city", &owner.city),
    ] {
        if value.trim().is_empty() {
            result.reject_value(field, "required", "must not be blank");
        }
    }

    let telephone = owner.telephone.trim();
    if telephone.is_empty() {
        result.reject_value("telephone", "required", "must not be blank");
    } else if telephone.len() > MAX_TELEPHONE_DIGITS
        || !telephone.bytes().all(|b| b.is_ascii_digit())
    {
        result.reject_value(
            "telephone",
            "digits",
            format!("must be a number of at most {MAX_TELEPHONE_DIGITS} digits"),
        );
    }

    result
}
