//! Opaque 128-bit asset identifiers

use crate::{StowageError, StowageResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of an asset, independent of the bundle that carries it.
///
/// Written as 32 hexadecimal digits in catalogs. Parsing accepts either case;
/// formatting always produces lowercase.
///
/// # Example
///
/// ```
/// use stowage_core::AssetId;
///
/// let id: AssetId = "0123456789ABCDEF0123456789abcdef".parse()?;
/// assert_eq!(id.to_string(), "0123456789abcdef0123456789abcdef");
/// # Ok::<(), stowage_core::StowageError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssetId([u8; 16]);

impl AssetId {
    /// Length of the hexadecimal form
    pub const HEX_LEN: usize = 32;

    /// Create an identifier from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Parse the 32-digit hexadecimal form
    pub fn parse_hex(text: &str) -> StowageResult<Self> {
        if text.len() != Self::HEX_LEN {
            return Err(StowageError::SerializationError(format!(
                "asset id must be {} hex digits, got {}",
                Self::HEX_LEN,
                text.len()
            )));
        }
        let decoded = hex::decode(text).map_err(|e| {
            StowageError::SerializationError(format!("invalid asset id '{text}': {e}"))
        })?;
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Raw bytes of the identifier
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Whether this is the all-zero identifier used for "no asset"
    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for AssetId {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_hex(&text).map_err(serde::de::Error::custom)
    }
}
