use crate::params::ParamKey;

/// Errors raised while editing the live parameter set.
///
/// The numeric core never fails; only the edit boundary does.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("parameter `{key}` expects a {expected} value")]
    TypeMismatch { key: ParamKey, expected: &'static str },

    #[error("parameter `{key}` must be finite, got {value}")]
    NonFinite { key: ParamKey, value: f32 },

    #[error("invalid color `{0}`, expected #RRGGBB or #RGB")]
    InvalidColor(String),
}
