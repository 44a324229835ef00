//! [`Amount`] represents an invoice amount in satoshis.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// An amount of satoshis charged for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u64);

impl Amount {
    /// The amount in millisatoshis, as LNURL-pay expects it.
    ///
    /// Returns `None` on overflow.
    pub fn as_msat(&self) -> Option<u64> {
        self.0.checked_mul(1000)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for Amount {
    fn from(value: u8) -> Self {
        Amount(value as u64)
    }
}

impl From<u16> for Amount {
    fn from(value: u16) -> Self {
        Amount(value as u64)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Amount(value as u64)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = s.parse::<u64>().map_err(serde::de::Error::custom)?;
        Ok(Amount(value))
    }
}
