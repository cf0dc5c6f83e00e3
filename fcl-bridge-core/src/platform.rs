//! Interfaces the host app implements for the bridge.
//!
//! The bridge never touches keys, screens or the network directly. Each capability is a
//! foreign trait so the same engine runs on every platform:
//!
//! - [`ApprovalPresenter`] — asks the human to approve or deny a request
//! - [`KeySigner`] — signs bytes with the wallet key
//! - [`FeePayerService`] — sponsors fees and countersigns envelopes
//! - [`NetworkProvider`] — reports and switches the active network
//! - [`PageSink`] — evaluates JavaScript in the embedded page
//! - [`TransactionSink`] — receives records of submitted transactions
//!
//! Every call that may be shared across tabs carries the bridge's session identifier.

use crate::{error::BridgeError, wire::AppInfo, Network};

/// What the human is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum ApprovalRequest {
    /// Connect the wallet to a dApp.
    Authn {
        /// The requesting dApp.
        app: AppInfo,
        /// Network the wallet will operate on.
        network: Network,
    },
    /// Authorize a transaction.
    Authz {
        /// The requesting dApp.
        app: AppInfo,
        /// Cadence script of the transaction.
        cadence: String,
        /// Arguments as JSON-Cadence.
        arguments: Vec<String>,
    },
    /// Sign an arbitrary message.
    UserSignature {
        /// The requesting dApp.
        app: AppInfo,
        /// The message, as UTF-8 when it decodes, hex otherwise.
        message: String,
    },
    /// Link a child account to the wallet.
    AccountLink {
        /// The requesting dApp.
        app: AppInfo,
        /// Cadence script of the linking transaction.
        cadence: String,
    },
}

/// Outcome of an approval prompt.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ApprovalResult {
    /// Whether the human approved.
    pub approved: bool,
    /// Optional data collected by the prompt.
    pub data: Option<String>,
}

/// Envelope signature returned by a remote fee payer.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct RemoteSignature {
    /// Fee payer address.
    pub address: String,
    /// Key index the fee payer signed with.
    pub key_id: u32,
    /// Hex signature.
    pub signature: String,
}

/// A transaction the dApp submitted after the wallet signed it.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SubmittedTransaction {
    /// Transaction id reported by the page.
    pub tx_id: String,
    /// Host of the dApp that submitted it.
    pub url: Option<String>,
    /// Title of the dApp that submitted it.
    pub title: Option<String>,
    /// The signed voucher as JSON.
    pub voucher_json: String,
}

/// Human approval UI.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait ApprovalPresenter: Send + Sync {
    /// Shows `request` and resolves once the human decides.
    ///
    /// # Errors
    /// Returns an error if the prompt cannot be shown.
    async fn present_approval(
        &self,
        session_id: String,
        request: ApprovalRequest,
    ) -> Result<ApprovalResult, BridgeError>;

    /// Shows a failure notice.
    fn present_failure(&self, session_id: String, message: String);
}

/// Wallet keystore.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait KeySigner: Send + Sync {
    /// Signs `message` (already domain-tagged) with the wallet key.
    ///
    /// # Errors
    /// Returns an error if the keystore refuses or fails.
    async fn sign(&self, session_id: String, message: Vec<u8>) -> Result<Vec<u8>, BridgeError>;
}

/// Fee sponsorship backend.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait FeePayerService: Send + Sync {
    /// Whether fees are currently sponsored.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be reached.
    async fn sponsorship_enabled(&self, session_id: String) -> Result<bool, BridgeError>;

    /// Current key index of the fee payer account at `address`.
    ///
    /// # Errors
    /// Returns an error if the account cannot be fetched or has no usable key.
    async fn fetch_key_index(
        &self,
        session_id: String,
        address: String,
    ) -> Result<u32, BridgeError>;

    /// Countersigns `envelope_message` (hex) for the transaction in `voucher_json`.
    ///
    /// # Errors
    /// Returns an error if the fee payer refuses or fails to sign.
    async fn sign_envelope(
        &self,
        session_id: String,
        voucher_json: String,
        envelope_message: String,
    ) -> Result<RemoteSignature, BridgeError>;
}

/// Active network of the wallet.
#[uniffi::export(with_foreign)]
pub trait NetworkProvider: Send + Sync {
    /// Network the wallet currently signs for.
    fn current_network(&self) -> Network;

    /// Offers the human to switch from `from` to `to`.
    fn switch_network_prompt(&self, session_id: String, from: Network, to: Network);
}

/// The embedded page's JavaScript context.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait PageSink: Send + Sync {
    /// Evaluates `script` in the page.
    ///
    /// # Errors
    /// Returns an error if the web view rejects the script.
    async fn evaluate_script(&self, script: String) -> Result<(), BridgeError>;
}

/// Consumer of submitted-transaction records.
#[uniffi::export(with_foreign)]
pub trait TransactionSink: Send + Sync {
    /// Called once per correlated transaction id.
    fn transaction_submitted(&self, session_id: String, transaction: SubmittedTransaction);
}
