//! Model variant definitions
//!
//! The bridge supports a closed set of model variants. Hosts select one by
//! enum value, or by raw integer discriminant when calling across an ABI
//! boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported vision-language model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// 0.5B parameters, smallest and fastest
    FastVlm05B,
    /// 1.5B parameters, balanced
    FastVlm15B,
    /// 7B parameters, highest quality
    FastVlm7B,
}

impl ModelVariant {
    /// Converts a raw host-side discriminant into a variant.
    ///
    /// Returns `None` for values outside the supported set; the caller is
    /// expected to reject those synchronously.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::FastVlm05B),
            1 => Some(Self::FastVlm15B),
            2 => Some(Self::FastVlm7B),
            _ => None,
        }
    }

    /// The raw discriminant used across the host ABI
    pub fn as_raw(self) -> i32 {
        match self {
            Self::FastVlm05B => 0,
            Self::FastVlm15B => 1,
            Self::FastVlm7B => 2,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FastVlm05B => "fastvlm-0.5b",
            Self::FastVlm15B => "fastvlm-1.5b",
            Self::FastVlm7B => "fastvlm-7b",
        };
        f.write_str(name)
    }
}
