//! Protocol constants and per-network defaults.

use crate::Network;

/// Width, in bytes, of every Flow domain tag.
pub const DOMAIN_TAG_LENGTH: usize = 32;

/// `type` of the message the wallet posts once its view is ready.
pub const FCL_VIEW_READY: &str = "FCL:VIEW:READY";

/// `type` of the message the page answers with after `FCL:VIEW:READY`.
pub const FCL_VIEW_READY_RESPONSE: &str = "FCL:VIEW:READY:RESPONSE";

/// `type` of every polling response the wallet posts back.
pub const FCL_VIEW_RESPONSE: &str = "FCL:VIEW:RESPONSE";

/// `f_type` marker of a service object.
pub const SERVICE_F_TYPE: &str = "Service";

/// Pragma that marks a cadence script as an account-linking transaction.
pub const ACCOUNT_LINKING_PRAGMA: &str = "#allowAccountLinking";

/// Name of the generic message channel registered in the web view.
pub const MESSAGE_CHANNEL: &str = "message";

/// Name of the channel the page uses to report submitted transactions.
pub const TRANSACTION_CHANNEL: &str = "transaction";

/// Domain separation tags used by Flow signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTag {
    /// Prefix of transaction payload and envelope messages.
    Transaction,
    /// Prefix of arbitrary user messages.
    User,
    /// Prefix of FCL account-proof messages.
    AccountProof,
}

impl DomainTag {
    /// The unpadded tag literal.
    #[must_use]
    pub const fn literal(self) -> &'static str {
        match self {
            Self::Transaction => "FLOW-V0.0-transaction",
            Self::User => "FLOW-V0.0-user",
            Self::AccountProof => "FCL-ACCOUNT-PROOF-V0.0",
        }
    }

    /// The tag right-padded with zero bytes to [`DOMAIN_TAG_LENGTH`].
    #[must_use]
    pub fn normalized(self) -> [u8; DOMAIN_TAG_LENGTH] {
        let literal = self.literal().as_bytes();
        let mut tag = [0u8; DOMAIN_TAG_LENGTH];
        tag[..literal.len()].copy_from_slice(literal);
        tag
    }

    /// Prepends the normalized tag to `message`.
    #[must_use]
    pub fn prefix(self, message: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(DOMAIN_TAG_LENGTH + message.len());
        out.extend_from_slice(&self.normalized());
        out.extend_from_slice(message);
        out
    }
}

impl Network {
    /// Returns the Flow REST access node for the network.
    #[must_use]
    pub const fn access_node_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://rest-mainnet.onflow.org",
            Self::Testnet => "https://rest-testnet.onflow.org",
            Self::Previewnet => "https://rest-previewnet.onflow.org",
            Self::Emulator => "http://localhost:8888",
        }
    }
}
