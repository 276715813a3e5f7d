//! Configuration errors.
//!
//! Nothing on the per-frame path returns these. They exist for callers that
//! build windows or params from external input and want to report bad values
//! instead of silently getting an idle animation.

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("trigger window stop ({stop}) must be greater than start ({start})")]
    EmptyWindow { start: f64, stop: f64 },

    #[error("non-finite value for {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("smoothing factor {0} is outside (0, 1]")]
    SmoothingFactor(f64),

    #[error("threshold {0} is outside [0, 1]")]
    Threshold(f64),
}

impl ConfigError {
    pub(crate) fn check_finite(field: &'static str, value: f64) -> ConfigResult<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NonFinite { field, value })
        }
    }
}
