use thiserror::Error;

/// Errors raised at the parameter input boundary.
///
/// The pattern formulas themselves never fail; these only guard the mapping
/// from raw inlet values (index, text) onto [`crate::EchoParams`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter index {0} (expected 0-11)")]
    UnknownSlot(usize),

    #[error("unknown parameter name '{0}'")]
    UnknownName(String),

    #[error("value for {slot} must be finite, got {value}")]
    NonFinite { slot: &'static str, value: f64 },

    #[error("invalid value '{value}' for {slot}")]
    InvalidValue { slot: &'static str, value: String },
}
