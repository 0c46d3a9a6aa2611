//! Deserializes 4-byte fork versions written as `0x`-prefixed hex strings.

use alloy_primitives::{aliases::B32, hex};
use serde::{Deserialize, Deserializer, de::Error};

pub fn deserialize<'de, D>(deserializer: D) -> Result<B32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    let stripped = value
        .strip_prefix("0x")
        .ok_or_else(|| D::Error::custom(format!("Missing 0x prefix on fork version {value}")))?;
    let bytes = hex::decode(stripped).map_err(D::Error::custom)?;
    B32::try_from(bytes.as_slice()).map_err(D::Error::custom)
}
