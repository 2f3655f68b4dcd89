//! Generation parameter types
//!
//! Holds the mutable generation configuration. Each accepted inference
//! request captures a snapshot of these values at dispatch time; updates
//! never affect a request already in flight.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted sampling temperature
pub const MIN_TEMPERATURE: f32 = 0.0;
/// Highest accepted sampling temperature
pub const MAX_TEMPERATURE: f32 = 2.0;
/// Backend-imposed ceiling on tokens generated per request
pub const MAX_TOKENS_LIMIT: u32 = 4096;

/// Parameter validation failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    #[error("temperature {0} outside valid range {MIN_TEMPERATURE}..={MAX_TEMPERATURE}")]
    Temperature(f32),

    #[error("max_tokens {0} outside valid range 1..={MAX_TOKENS_LIMIT}")]
    MaxTokens(u32),
}

/// Generation parameters for inference
///
/// Out-of-range values are rejected, never clamped, so the host always knows
/// exactly what the next request will run with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Temperature for sampling (0.0 = greedy, higher = more random)
    pub temperature: f32,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 256,
        }
    }
}

impl GenerationParams {
    /// Builds a validated parameter set
    pub fn new(temperature: f32, max_tokens: u32) -> Result<Self, ParamsError> {
        let params = Self {
            temperature,
            max_tokens,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks both fields against their documented bounds
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.temperature.is_finite()
            || !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature)
        {
            return Err(ParamsError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(ParamsError::MaxTokens(self.max_tokens));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = GenerationParams::default();
        assert!(params.validate().is_ok());
        assert!((params.temperature - 0.2).abs() < 0.001);
        assert_eq!(params.max_tokens, 256);
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GenerationParams::new(0.0, 1).is_ok());
        assert!(GenerationParams::new(2.0, MAX_TOKENS_LIMIT).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        assert_eq!(
            GenerationParams::new(2.5, 100),
            Err(ParamsError::Temperature(2.5))
        );
        assert_eq!(
            GenerationParams::new(-0.1, 100),
            Err(ParamsError::Temperature(-0.1))
        );
        assert!(GenerationParams::new(f32::NAN, 100).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_max_tokens() {
        assert_eq!(
            GenerationParams::new(0.5, 0),
            Err(ParamsError::MaxTokens(0))
        );
        assert_eq!(
            GenerationParams::new(0.5, 10_000),
            Err(ParamsError::MaxTokens(10_000))
        );
    }

    #[test]
    fn test_serialization() {
        let params = GenerationParams::default();
        let json = serde_json::to_string(&params).expect("Failed to serialize");
        let deserialized: GenerationParams =
            serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(params, deserialized);
    }
}
