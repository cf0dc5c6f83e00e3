//! Canonical message for FCL account-proof challenges.
//!
//! ```text
//! message = [domain_tag ||] rlp([utf8(app_identifier), address_bytes, nonce_bytes])
//! ```
//!
//! The resulting bytes, not the nonce, are what the wallet key signs.

use alloy_rlp::{Encodable, Header};

use crate::{
    defaults::DomainTag,
    error::BridgeError,
    primitives::{decode_hex, FlowAddress},
};

/// Encodes an account-proof message.
///
/// An empty nonce means no proof was requested and yields empty bytes.
///
/// # Errors
/// - `BridgeError::MissingAppIdentifier` if a nonce is present but `app_identifier` is not.
/// - `BridgeError::InvalidInput` if the nonce is not hex.
pub fn encode_account_proof(
    address: &FlowAddress,
    nonce_hex: &str,
    app_identifier: Option<&str>,
    include_domain_tag: bool,
) -> Result<Vec<u8>, BridgeError> {
    if nonce_hex.trim().is_empty() {
        return Ok(Vec::new());
    }
    let app_identifier = app_identifier.ok_or(BridgeError::MissingAppIdentifier)?;
    let nonce = decode_hex(nonce_hex, "nonce")?;

    let items: [&[u8]; 3] = [app_identifier.as_bytes(), address.as_bytes(), &nonce];
    let payload_length: usize = items.iter().map(|item| item.length()).sum();

    let mut rlp = Vec::with_capacity(payload_length + 8);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut rlp);
    for item in items {
        item.encode(&mut rlp);
    }

    if include_domain_tag {
        Ok(DomainTag::AccountProof.prefix(&rlp))
    } else {
        Ok(rlp)
    }
}

/// Encodes an account-proof message for foreign callers that verify proofs themselves.
///
/// # Errors
/// See [`encode_account_proof`]; the address must also parse.
#[uniffi::export]
pub fn encode_account_proof_message(
    address: &str,
    nonce_hex: &str,
    app_identifier: Option<String>,
    include_domain_tag: bool,
) -> Result<Vec<u8>, BridgeError> {
    use crate::primitives::ParseFromForeignBinding;

    let address = FlowAddress::parse_from_ffi(address, "address")?;
    encode_account_proof(
        &address,
        nonce_hex,
        app_identifier.as_deref(),
        include_domain_tag,
    )
}
