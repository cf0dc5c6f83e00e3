//! Host-provided configuration of the wallet's FCL services.

use serde::{Deserialize, Serialize};

use crate::{
    error::BridgeError,
    primitives::{FlowAddress, ParseFromForeignBinding},
};

/// Describes the wallet account and how its services are advertised to dApps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct BridgeConfig {
    /// Address of the account the wallet signs with.
    pub wallet_address: String,
    /// Index of the wallet key on that account.
    pub key_index: u32,
    /// Wallet name shown to dApps in the service provider block.
    pub wallet_name: String,
    /// Wallet icon URL shown to dApps.
    pub wallet_icon: String,
    /// Prefix of every service `uid`, e.g. `mywallet` yields `mywallet#authz`.
    pub service_uid: String,
    /// Endpoint advertised for every service.
    pub endpoint: String,
    /// Whether the wallet advertises the user-signature capability.
    #[serde(default = "default_true")]
    pub user_signature_enabled: bool,
    /// Account paying fees for sponsored transactions, when sponsorship is available.
    #[serde(default)]
    pub fee_payer_address: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl BridgeConfig {
    /// Parses a configuration from JSON and validates the addresses.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidInput` if the JSON is malformed or an address is invalid.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BridgeError::InvalidInput {
                attribute: "config".to_string(),
                reason: format!("invalid bridge config json: {e}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Ensures addresses parse.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidInput` naming the offending attribute.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.wallet()?;
        self.fee_payer()?;
        Ok(())
    }

    /// The wallet address.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidInput` if the address is invalid.
    pub fn wallet(&self) -> Result<FlowAddress, BridgeError> {
        FlowAddress::parse_from_ffi(&self.wallet_address, "wallet_address")
    }

    /// The fee payer address, if configured.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidInput` if the address is invalid.
    pub fn fee_payer(&self) -> Result<Option<FlowAddress>, BridgeError> {
        FlowAddress::parse_from_ffi_optional(
            self.fee_payer_address.clone(),
            "fee_payer_address",
        )
    }

    /// Builds the `uid` of a service, e.g. `mywallet#authn`.
    #[must_use]
    pub fn uid(&self, service: &str) -> String {
        format!("{}#{service}", self.service_uid)
    }
}

/// Parses a [`BridgeConfig`] from JSON.
///
/// # Errors
/// See [`BridgeConfig::from_json`].
#[uniffi::export]
pub fn bridge_config_from_json(json: &str) -> Result<BridgeConfig, BridgeError> {
    BridgeConfig::from_json(json)
}
