//! Backend configuration.
//!
//! With the `serde` feature the configuration round-trips through JSON:
//! ```json
//! { "sigmoid": "LookupCentered", "softmax_epsilon": 1e-6 }
//! ```
//! Missing fields take their defaults.

use crate::error::{Error, Result};

/// Denominator guard added to the softmax row sum.
pub const DEFAULT_SOFTMAX_EPSILON: f32 = 1e-6;

/// How the reference backend evaluates the logistic sigmoid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SigmoidImpl {
    #[default]
    Exact,
    /// Table sampled over `[0, range]`, mirrored for negative inputs.
    LookupCentered,
    /// Table sampled over `[-range, range]`.
    LookupNoncentered,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackendConfig {
    pub sigmoid: SigmoidImpl,
    pub softmax_epsilon: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            sigmoid: SigmoidImpl::default(),
            softmax_epsilon: DEFAULT_SOFTMAX_EPSILON,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.softmax_epsilon.is_finite() || self.softmax_epsilon < 0.0 {
            return Err(Error::Config(format!(
                "softmax_epsilon must be finite and non-negative, got {}",
                self.softmax_epsilon
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BackendConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(format!("JSON serialise error: {e}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.sigmoid, SigmoidImpl::Exact);
        assert_eq!(config.softmax_epsilon, 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_epsilon() {
        let config = BackendConfig {
            softmax_epsilon: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = BackendConfig {
            softmax_epsilon: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json() {
        let config = BackendConfig::from_json(r#"{ "sigmoid": "LookupCentered" }"#).unwrap();
        assert_eq!(config.sigmoid, SigmoidImpl::LookupCentered);
        assert_eq!(config.softmax_epsilon, DEFAULT_SOFTMAX_EPSILON);

        let json = config.to_json().unwrap();
        assert_eq!(BackendConfig::from_json(&json).unwrap(), config);

        assert!(BackendConfig::from_json(r#"{ "softmax_epsilon": -0.5 }"#).is_err());
        assert!(BackendConfig::from_json("not json").is_err());
    }
}
