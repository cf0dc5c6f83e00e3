//! Maps the roles FCL requests for a transaction to what the wallet has to sign.

use crate::{defaults::ACCOUNT_LINKING_PRAGMA, error::BridgeError, wire::Roles};

/// What the wallet must sign for an authz request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SigningObligation {
    /// Proposer, authorizer and payer at once: a single signature finishes the flow.
    SignAuthz,
    /// Proposer and authorizer: sign the payload, then a fee payer signs the envelope.
    SignPayload,
    /// Payer only: the fee payer countersigns the envelope.
    SignEnvelope,
    /// The script links a child account; handled by its own approval flow.
    AccountLink,
}

/// Resolves the obligation for a role vector.
///
/// # Errors
/// Returns `BridgeError::UnsupportedRoleVector` for any combination outside
/// `{111, 110, 001}`.
pub fn resolve_roles(roles: Roles) -> Result<SigningObligation, BridgeError> {
    match (roles.proposer, roles.authorizer, roles.payer) {
        (true, true, true) => Ok(SigningObligation::SignAuthz),
        (true, true, false) => Ok(SigningObligation::SignPayload),
        (false, false, true) => Ok(SigningObligation::SignEnvelope),
        (proposer, authorizer, payer) => Err(BridgeError::UnsupportedRoleVector {
            proposer,
            authorizer,
            payer,
        }),
    }
}

/// Whether `cadence` is an account-linking transaction.
#[must_use]
pub fn is_account_linking(cadence: &str) -> bool {
    cadence.trim().starts_with(ACCOUNT_LINKING_PRAGMA)
}

/// Resolves the obligation for a request. The account-linking pragma takes precedence over
/// the role vector.
///
/// # Errors
/// See [`resolve_roles`].
pub fn resolve_obligation(
    cadence: &str,
    roles: Roles,
) -> Result<SigningObligation, BridgeError> {
    if is_account_linking(cadence) {
        return Ok(SigningObligation::AccountLink);
    }
    resolve_roles(roles)
}
