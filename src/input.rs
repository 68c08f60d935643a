//! Parsing of the user-editable numeric fields
//!
//! Text that does not parse to a finite number is rejected instead of being turned into NaN.

use thiserror::Error;

use crate::network::N_INPUTS;

/// Errors for text field edits
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("'{text}' is not a number")]
    NotANumber { text: String },
    #[error("'{text}' is not a finite number")]
    NonFinite { text: String },
    #[error("Input index out of range")]
    NoSuchInput { index: usize, n_inputs: usize },
}

/// The numeric fields a presentation layer may edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LearningRate,
    Input(usize),
    Target,
}

impl Field {
    /// Checks that the field refers to something that exists
    pub fn validate(self) -> Result<Self, InputError> {
        match self {
            Field::Input(index) if index >= N_INPUTS => Err(InputError::NoSuchInput {
                index,
                n_inputs: N_INPUTS,
            }),
            _ => Ok(self),
        }
    }
}

/// Parses a finite `f64`, ignoring surrounding whitespace
pub fn parse_finite(text: &str) -> Result<f64, InputError> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber {
            text: text.to_string(),
        })?;
    if !value.is_finite() {
        return Err(InputError::NonFinite {
            text: text.to_string(),
        });
    }
    Ok(value)
}
