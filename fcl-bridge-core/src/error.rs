use thiserror::Error;

use crate::Network;

/// Error outputs from the FCL bridge
#[derive(Debug, Error, uniffi::Error)]
pub enum BridgeError {
    /// The message arriving from the page is not valid JSON or does not have the expected shape
    #[error("decode_error: {error}")]
    Decode {
        /// Description of what failed to decode.
        error: String,
    },
    /// The roles requested by the dApp do not map to any signing obligation
    #[error("unsupported_role_vector: proposer={proposer}, authorizer={authorizer}, payer={payer}")]
    UnsupportedRoleVector {
        /// Whether the signer was asked to act as proposer.
        proposer: bool,
        /// Whether the signer was asked to act as authorizer.
        authorizer: bool,
        /// Whether the signer was asked to act as payer.
        payer: bool,
    },
    /// An envelope signature was requested before the payload was approved
    #[error("out_of_order_envelope")]
    OutOfOrderEnvelope,
    /// The dApp targets a different network than the one active in the wallet
    #[error("network_mismatch: wallet is on {current}, dApp requested {requested}")]
    NetworkMismatch {
        /// Network currently selected in the wallet.
        current: Network,
        /// Network requested by the dApp.
        requested: Network,
    },
    /// The dApp asked for an account proof without identifying itself
    #[error("appIdentifier must be defined for provable authn")]
    MissingAppIdentifier,
    /// The remote fee payer refused or failed to sign the envelope
    #[error("remote_signing_failure: {error}")]
    RemoteSigningFailure {
        /// Details returned by the fee payer or the transport.
        error: String,
    },
    /// The human declined the request
    #[error("approval_denied")]
    ApprovalDenied,
    /// A newer phase replaced the one this result belongs to
    #[error("stale_phase: result of a superseded phase was discarded")]
    StalePhase,
    /// The presented input is not valid for the requested operation
    #[error("invalid_input_{attribute}: {reason}")]
    InvalidInput {
        /// The attribute that is invalid.
        attribute: String,
        /// The reason the input is invalid.
        reason: String,
    },
    /// Unexpected error serializing information
    #[error("serialization_error: {error}")]
    SerializationError {
        /// The error message from the serialization.
        error: String,
    },
    /// Network connection error with details
    #[error("network_error at {url}: {error}")]
    NetworkError {
        /// The URL of the request.
        url: String,
        /// The error message from the request.
        error: String,
        /// The HTTP status code of the request, if available.
        status: Option<u16>,
    },
    /// The wallet keystore could not produce a signature
    #[error("signing_failure: {error}")]
    SigningFailure {
        /// The error message reported by the keystore.
        error: String,
    },
    /// The embedded page could not evaluate the posted script
    #[error("page_delivery_error: {error}")]
    PageDelivery {
        /// The error message reported by the web view.
        error: String,
    },
    /// Unexpected error from a foreign callback
    #[error("unexpected_uniffi_callback_error: {0}")]
    UnexpectedUniFFICallbackError(String),
    /// Generic error
    #[error("{error}")]
    Generic {
        /// The details of the error.
        error: String,
    },
}

/// How the bridge reacts to a failed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ErrorDisposition {
    /// Log, drop the message and reset. Nothing is shown to the user.
    RecoverSilently,
    /// Reset and show a failure notice to the user.
    SurfaceToUser,
    /// Reset and route the user to the network switcher.
    SwitchNetwork,
}

impl BridgeError {
    /// Classifies the error according to the bridge's propagation policy.
    #[must_use]
    pub const fn disposition(&self) -> ErrorDisposition {
        match self {
            Self::Decode { .. }
            | Self::UnsupportedRoleVector { .. }
            | Self::OutOfOrderEnvelope
            | Self::ApprovalDenied
            | Self::StalePhase => ErrorDisposition::RecoverSilently,
            Self::NetworkMismatch { .. } => ErrorDisposition::SwitchNetwork,
            Self::MissingAppIdentifier
            | Self::RemoteSigningFailure { .. }
            | Self::InvalidInput { .. }
            | Self::SerializationError { .. }
            | Self::NetworkError { .. }
            | Self::SigningFailure { .. }
            | Self::PageDelivery { .. }
            | Self::UnexpectedUniFFICallbackError(_)
            | Self::Generic { .. } => ErrorDisposition::SurfaceToUser,
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(error: reqwest::Error) -> Self {
        Self::NetworkError {
            url: error
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            error: error.to_string(),
            status: error.status().map(|s| s.as_u16()),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode {
            error: error.to_string(),
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for BridgeError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}
