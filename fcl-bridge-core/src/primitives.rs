use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Length of a Flow account address in bytes.
pub const FLOW_ADDRESS_LENGTH: usize = 8;

/// A Flow account address.
///
/// Parsing accepts the address with or without the `0x` prefix and left-pads short
/// addresses (FCL strips leading zeros in some places). Displayed as `0x` + 16 lowercase hex
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowAddress([u8; FLOW_ADDRESS_LENGTH]);

impl FlowAddress {
    /// Raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FLOW_ADDRESS_LENGTH] {
        &self.0
    }

    /// Hex form without the `0x` prefix, as used in REST paths.
    #[must_use]
    pub fn sans_prefix(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for FlowAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s, "address")?;
        if bytes.len() > FLOW_ADDRESS_LENGTH {
            return Err(BridgeError::InvalidInput {
                attribute: "address".to_string(),
                reason: format!("expected at most {FLOW_ADDRESS_LENGTH} bytes"),
            });
        }
        let mut address = [0u8; FLOW_ADDRESS_LENGTH];
        address[FLOW_ADDRESS_LENGTH - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(address))
    }
}

impl fmt::Display for FlowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.sans_prefix())
    }
}

/// A trait for parsing primitive types from foreign bindings.
///
/// Used to parse values handed over by the host app, e.g. a stringified address into a
/// [`FlowAddress`], attributing failures to the offending attribute.
pub trait ParseFromForeignBinding {
    /// Parses `s`, reporting failures against `attr`.
    ///
    /// # Errors
    /// - `BridgeError::InvalidInput` if the provided string is not valid.
    fn parse_from_ffi(s: &str, attr: &'static str) -> Result<Self, BridgeError>
    where
        Self: Sized;

    /// Parses an optional value.
    ///
    /// # Errors
    /// - `BridgeError::InvalidInput` if the provided string is present but not valid.
    fn parse_from_ffi_optional(
        s: Option<String>,
        attr: &'static str,
    ) -> Result<Option<Self>, BridgeError>
    where
        Self: Sized;
}

impl ParseFromForeignBinding for FlowAddress {
    fn parse_from_ffi(s: &str, attr: &'static str) -> Result<Self, BridgeError> {
        Self::from_str(s).map_err(|e| BridgeError::InvalidInput {
            attribute: attr.to_string(),
            reason: e.to_string(),
        })
    }

    fn parse_from_ffi_optional(
        s: Option<String>,
        attr: &'static str,
    ) -> Result<Option<Self>, BridgeError> {
        if let Some(s) = s {
            return Self::parse_from_ffi(s.as_str(), attr).map(Some);
        }
        Ok(None)
    }
}

/// Decodes a hex string, tolerating a `0x` prefix and an odd number of digits.
///
/// # Errors
/// Returns `BridgeError::InvalidInput` naming `attr` if the string is not hex.
pub fn decode_hex(s: &str, attr: &str) -> Result<Vec<u8>, BridgeError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let result = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    result.map_err(|e| BridgeError::InvalidInput {
        attribute: attr.to_string(),
        reason: e.to_string(),
    })
}
