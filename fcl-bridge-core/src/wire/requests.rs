use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::service::Service;
use crate::Network;

/// dApp identity shown to the human when approving a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct AppInfo {
    /// dApp title from `config.app.title`.
    pub title: Option<String>,
    /// dApp icon URL from `config.app.icon`.
    pub icon: Option<String>,
    /// Page host from `config.client.hostname`.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FclAppConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FclClientConfig {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub fcl_version: Option<String>,
}

/// The `config` object FCL attaches to a phase response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FclConfig {
    #[serde(default)]
    pub(crate) app: Option<FclAppConfig>,
    #[serde(default)]
    pub(crate) client: Option<FclClientConfig>,
}

impl FclConfig {
    /// dApp identity for approval screens.
    #[must_use]
    pub fn app_info(&self) -> AppInfo {
        let app = self.app.clone().unwrap_or_default();
        AppInfo {
            title: app.title,
            icon: app.icon,
            url: self.client.as_ref().and_then(|c| c.hostname.clone()),
        }
    }

    /// Network requested by the dApp, if it declared a known one. FCL names the emulator
    /// `local`.
    #[must_use]
    pub fn network(&self) -> Option<Network> {
        let name = self.client.as_ref()?.network.as_deref()?;
        match name {
            "local" => Some(Network::Emulator),
            other => other.parse().ok(),
        }
    }
}

/// A `FCL:VIEW:READY:RESPONSE` message, before its body is decoded for a specific phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResponse {
    /// Always `FCL:VIEW:READY:RESPONSE` for messages classified as phase responses.
    #[serde(rename = "type")]
    pub response_type: String,
    /// The service the dApp is executing.
    #[serde(default)]
    pub service: Option<Service>,
    /// FCL app and client configuration.
    #[serde(default)]
    pub config: Option<FclConfig>,
    /// Phase-specific payload.
    #[serde(default)]
    pub body: Value,
}

impl PhaseResponse {
    /// App identity, empty when no config was sent.
    #[must_use]
    pub fn app_info(&self) -> AppInfo {
        self.config.as_ref().map(FclConfig::app_info).unwrap_or_default()
    }

    /// Requested network, if any.
    #[must_use]
    pub fn network(&self) -> Option<Network> {
        self.config.as_ref().and_then(FclConfig::network)
    }
}

/// Body of an authn (or standalone account-proof) phase response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthnRequest {
    /// FCL extensions advertised by the dApp.
    #[serde(default)]
    pub extensions: Option<Vec<Value>>,
    /// Milliseconds since epoch when the dApp issued the request.
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Identifier bound into the account proof.
    #[serde(default)]
    pub app_identifier: Option<String>,
    /// Hex nonce of the account-proof challenge.
    #[serde(default)]
    pub nonce: Option<String>,
}

impl AuthnRequest {
    /// The nonce when an account proof was requested.
    #[must_use]
    pub fn challenge_nonce(&self) -> Option<&str> {
        self.nonce.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// The signing roles requested from the wallet for one transaction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Record,
)]
pub struct Roles {
    /// Sign as proposer.
    #[serde(default)]
    pub proposer: bool,
    /// Sign as authorizer.
    #[serde(default)]
    pub authorizer: bool,
    /// Sign as payer.
    #[serde(default)]
    pub payer: bool,
}

/// Opaque transaction template, round-tripped unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Voucher(pub Value);

impl Voucher {
    /// Cadence script embedded in the voucher.
    #[must_use]
    pub fn cadence(&self) -> Option<&str> {
        self.0.get("cadence").and_then(Value::as_str)
    }

    /// Transaction arguments, each rendered as compact JSON-Cadence.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        self.0
            .get("arguments")
            .and_then(Value::as_array)
            .map(|args| args.iter().map(Value::to_string).collect())
            .unwrap_or_default()
    }

    /// Compact JSON form.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

/// Body of an authz phase response (an FCL `Signable`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthzRequest {
    /// Address FCL expects to sign.
    #[serde(default, rename = "addr")]
    pub signer_address: Option<String>,
    /// Cadence script of the transaction.
    #[serde(default)]
    pub cadence: String,
    /// Hex of the payload or envelope message to sign.
    #[serde(default, rename = "message")]
    pub message_hex: String,
    /// Requested roles.
    #[serde(default)]
    pub roles: Roles,
    /// Transaction template.
    #[serde(default)]
    pub voucher: Voucher,
}

impl AuthzRequest {
    /// The script shown to the human, falling back to the voucher's copy.
    #[must_use]
    pub fn script(&self) -> &str {
        if self.cadence.is_empty() {
            self.voucher.cadence().unwrap_or_default()
        } else {
            &self.cadence
        }
    }
}

/// Body of a user-signature phase response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSignatureRequest {
    /// Hex of the message to sign.
    #[serde(rename = "message")]
    pub message_to_sign: String,
    /// dApp title.
    #[serde(skip)]
    pub app_title: Option<String>,
    /// dApp icon.
    #[serde(skip)]
    pub app_icon: Option<String>,
}

impl UserSignatureRequest {
    /// Best-effort human-readable form of the message: UTF-8 when it decodes, hex otherwise.
    #[must_use]
    pub fn readable_message(&self) -> String {
        crate::primitives::decode_hex(&self.message_to_sign, "message")
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| self.message_to_sign.clone())
    }
}

/// Body of the transaction channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSubmission {
    /// Id of the transaction the dApp submitted.
    #[serde(rename = "txId")]
    pub tx_id: String,
}
