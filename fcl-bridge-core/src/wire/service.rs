use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol phase a service or phase response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, uniffi::Enum)]
#[serde(from = "String")]
pub enum ServiceType {
    /// Authentication: the dApp learns the wallet's address and services.
    Authn,
    /// Pre-authorization: the wallet names the proposer, payer and authorizers.
    PreAuthz,
    /// Transaction authorization.
    Authz,
    /// Arbitrary user message signing.
    UserSignature,
    /// Standalone account-proof challenge.
    AccountProof,
    /// Anything else.
    Unknown,
}

impl ServiceType {
    /// Maps a wire name to a service type. FCL uses kebab-case names; some clients send
    /// camelCase.
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "authn" => Self::Authn,
            "pre-authz" | "preAuthz" => Self::PreAuthz,
            "authz" => Self::Authz,
            "user-signature" | "userSignature" => Self::UserSignature,
            "account-proof" | "accountProof" => Self::AccountProof,
            _ => Self::Unknown,
        }
    }

    /// Canonical wire name.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Authn => "authn",
            Self::PreAuthz => "pre-authz",
            Self::Authz => "authz",
            Self::UserSignature => "user-signature",
            Self::AccountProof => "account-proof",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for ServiceType {
    fn from(name: String) -> Self {
        Self::from_wire(&name)
    }
}

impl Serialize for ServiceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A service object as sent by FCL. Only the fields the bridge reads are typed; the rest is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Phase the service belongs to.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    /// `"Service"` on normalized services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_type: Option<String>,
    /// Wallet endpoint the dApp resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Wallet-defined service identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Extra parameters passed to the wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Service {
    /// The service type, defaulting to [`ServiceType::Unknown`].
    #[must_use]
    pub fn kind(&self) -> ServiceType {
        self.service_type.unwrap_or(ServiceType::Unknown)
    }
}
