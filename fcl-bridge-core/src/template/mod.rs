//! Polling-response generation by literal token substitution.
//!
//! Templates are canned JSON documents containing [`Token`] sentinels. Every substituted
//! value is a complete JSON literal (strings arrive already quoted and escaped), so a rendered
//! template is always valid JSON.

mod responses;

use std::collections::BTreeMap;

use strum::{EnumIter, IntoEnumIterator};

pub use responses::*;

/// A placeholder in a response template.
///
/// Literals are wrapped in `%%` on both sides, so no literal is a prefix of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Token {
    /// Wallet address.
    Address,
    /// Wallet key index.
    KeyId,
    /// Hex signature.
    Signature,
    /// Wallet display name.
    WalletName,
    /// Wallet icon URL.
    WalletIcon,
    /// Endpoint advertised for every service.
    Endpoint,
    /// `uid` of the authn service.
    AuthnUid,
    /// `uid` of the authz service.
    AuthzUid,
    /// `uid` of the pre-authz service.
    PreAuthzUid,
    /// `uid` of the user-signature service.
    UserSignatureUid,
    /// `uid` of the account-proof service.
    AccountProofUid,
    /// Fee payer address.
    PayerAddress,
    /// Fee payer key index.
    PayerKeyId,
    /// Account-proof nonce.
    Nonce,
    /// Optional pre-authz service fragment.
    PreAuthzService,
    /// Optional user-signature service fragment.
    UserSignatureService,
    /// Optional account-proof service fragment.
    AccountProofService,
}

impl Token {
    /// The sentinel text that appears in templates.
    #[must_use]
    pub const fn literal(self) -> &'static str {
        match self {
            Self::Address => "%%ADDRESS%%",
            Self::KeyId => "%%KEY_ID%%",
            Self::Signature => "%%SIGNATURE%%",
            Self::WalletName => "%%WALLET_NAME%%",
            Self::WalletIcon => "%%WALLET_ICON%%",
            Self::Endpoint => "%%ENDPOINT%%",
            Self::AuthnUid => "%%AUTHN_UID%%",
            Self::AuthzUid => "%%AUTHZ_UID%%",
            Self::PreAuthzUid => "%%PRE_AUTHZ_UID%%",
            Self::UserSignatureUid => "%%USER_SIGNATURE_UID%%",
            Self::AccountProofUid => "%%ACCOUNT_PROOF_UID%%",
            Self::PayerAddress => "%%PAYER_ADDRESS%%",
            Self::PayerKeyId => "%%PAYER_KEY_ID%%",
            Self::Nonce => "%%NONCE%%",
            Self::PreAuthzService => "%%PRE_AUTHZ_SERVICE%%",
            Self::UserSignatureService => "%%USER_SIGNATURE_SERVICE%%",
            Self::AccountProofService => "%%ACCOUNT_PROOF_SERVICE%%",
        }
    }
}

/// Values for the tokens of one rendering.
#[derive(Debug, Clone, Default)]
pub struct Substitutions(BTreeMap<Token, String>);

impl Substitutions {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `token` to a quoted, escaped JSON string.
    #[must_use]
    pub fn string(mut self, token: Token, value: &str) -> Self {
        self.0.insert(token, json_string(value));
        self
    }

    /// Sets `token` to raw JSON text (numbers, pre-rendered fragments, empty text).
    #[must_use]
    pub fn raw(mut self, token: Token, value: impl Into<String>) -> Self {
        self.0.insert(token, value.into());
        self
    }

    /// Sets `token` to a number.
    #[must_use]
    pub fn number(self, token: Token, value: u32) -> Self {
        self.raw(token, value.to_string())
    }
}

/// Replaces every token in `template` that has a value in `substitutions`.
///
/// Tokens without a value are left in place; see [`unresolved_tokens`].
#[must_use]
pub fn render(template: &str, substitutions: &Substitutions) -> String {
    substitutions
        .0
        .iter()
        .fold(template.to_string(), |out, (token, value)| {
            out.replace(token.literal(), value)
        })
}

/// Tokens still present in `rendered`.
#[must_use]
pub fn unresolved_tokens(rendered: &str) -> Vec<Token> {
    Token::iter()
        .filter(|token| rendered.contains(token.literal()))
        .collect()
}

fn json_string(value: &str) -> String {
    // serializing a &str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
