use super::{render, unresolved_tokens, Substitutions, Token};
use crate::{
    config::BridgeConfig,
    error::BridgeError,
    platform::FeePayerService,
    primitives::FlowAddress,
    wire::ServiceType,
};

/// Acknowledges a discovered service; the page answers with its phase payload.
pub const READY_TEMPLATE: &str = r#"{"type":"FCL:VIEW:READY"}"#;

const PRE_AUTHZ_TEMPLATE: &str = r#"{"f_type":"PollingResponse","f_vsn":"1.0.0","status":"APPROVED","reason":null,"data":{"f_type":"PreAuthzResponse","f_vsn":"1.0.0","proposer":{"f_type":"Service","f_vsn":"1.0.0","type":"authz","uid":%%AUTHZ_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","identity":{"address":%%ADDRESS%%,"keyId":%%KEY_ID%%}},"payer":[{"f_type":"Service","f_vsn":"1.0.0","type":"authz","uid":%%AUTHZ_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","identity":{"address":%%PAYER_ADDRESS%%,"keyId":%%PAYER_KEY_ID%%}}],"authorization":[{"f_type":"Service","f_vsn":"1.0.0","type":"authz","uid":%%AUTHZ_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","identity":{"address":%%ADDRESS%%,"keyId":%%KEY_ID%%}}]},"type":"FCL:VIEW:RESPONSE"}"#;

const AUTHN_TEMPLATE: &str = r#"{"f_type":"PollingResponse","f_vsn":"1.0.0","status":"APPROVED","reason":null,"data":{"f_type":"AuthnResponse","f_vsn":"1.0.0","addr":%%ADDRESS%%,"services":[{"f_type":"Service","f_vsn":"1.0.0","type":"authn","uid":%%AUTHN_UID%%,"endpoint":%%ENDPOINT%%,"id":%%ADDRESS%%,"identity":{"address":%%ADDRESS%%},"provider":{"f_type":"ServiceProvider","f_vsn":"1.0.0","address":%%ADDRESS%%,"name":%%WALLET_NAME%%,"icon":%%WALLET_ICON%%}}%%PRE_AUTHZ_SERVICE%%,{"f_type":"Service","f_vsn":"1.0.0","type":"authz","uid":%%AUTHZ_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","identity":{"address":%%ADDRESS%%,"keyId":%%KEY_ID%%}}%%USER_SIGNATURE_SERVICE%%%%ACCOUNT_PROOF_SERVICE%%]},"type":"FCL:VIEW:RESPONSE"}"#;

// Fragments carry their own leading comma so an omitted fragment leaves a valid array.
const PRE_AUTHZ_FRAGMENT: &str = r#",{"f_type":"Service","f_vsn":"1.0.0","type":"pre-authz","uid":%%PRE_AUTHZ_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","data":{"address":%%PAYER_ADDRESS%%,"keyId":%%PAYER_KEY_ID%%}}"#;

const USER_SIGNATURE_FRAGMENT: &str = r#",{"f_type":"Service","f_vsn":"1.0.0","type":"user-signature","uid":%%USER_SIGNATURE_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC"}"#;

const ACCOUNT_PROOF_FRAGMENT: &str = r#",{"f_type":"Service","f_vsn":"1.0.0","type":"account-proof","uid":%%ACCOUNT_PROOF_UID%%,"endpoint":%%ENDPOINT%%,"method":"EXT/RPC","data":{"f_type":"account-proof","f_vsn":"2.0.0","address":%%ADDRESS%%,"nonce":%%NONCE%%,"signatures":[{"f_type":"CompositeSignature","f_vsn":"1.0.0","addr":%%ADDRESS%%,"keyId":%%KEY_ID%%,"signature":%%SIGNATURE%%}]}}"#;

const ACCOUNT_PROOF_TEMPLATE: &str = r#"{"f_type":"PollingResponse","f_vsn":"1.0.0","status":"APPROVED","reason":null,"data":{"f_type":"account-proof","f_vsn":"2.0.0","address":%%ADDRESS%%,"nonce":%%NONCE%%,"signatures":[{"f_type":"CompositeSignature","f_vsn":"1.0.0","addr":%%ADDRESS%%,"keyId":%%KEY_ID%%,"signature":%%SIGNATURE%%}]},"type":"FCL:VIEW:RESPONSE"}"#;

const USER_SIGNATURE_TEMPLATE: &str = r#"{"f_type":"PollingResponse","f_vsn":"1.0.0","status":"APPROVED","reason":null,"data":[{"f_type":"CompositeSignature","f_vsn":"1.0.0","addr":%%ADDRESS%%,"keyId":%%KEY_ID%%,"signature":%%SIGNATURE%%}],"type":"FCL:VIEW:RESPONSE"}"#;

const AUTHZ_TEMPLATE: &str = r#"{"f_type":"PollingResponse","f_vsn":"1.0.0","status":"APPROVED","reason":null,"data":{"f_type":"CompositeSignature","f_vsn":"1.0.0","addr":%%ADDRESS%%,"keyId":%%KEY_ID%%,"signature":%%SIGNATURE%%},"type":"FCL:VIEW:RESPONSE"}"#;

/// Fee payer advertised through the pre-authz service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sponsorship {
    /// Fee payer account.
    pub payer: FlowAddress,
    /// Key the fee payer signs with.
    pub key_id: u32,
}

/// A signed account-proof challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAccountProof {
    /// The nonce as received from the dApp.
    pub nonce: String,
    /// Hex signature over the encoded account-proof message.
    pub signature: String,
}

/// A signature produced by `address` with key `key_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSignature {
    /// Signing account.
    pub address: FlowAddress,
    /// Signing key index.
    pub key_id: u32,
    /// Hex signature.
    pub signature: String,
}

/// Asks the fee payer whether sponsorship is on and, if so, which key it signs with.
///
/// # Errors
/// Any failure of the fee payer is propagated: sponsorship is never silently dropped. A
/// sponsoring fee payer without a configured address is `BridgeError::InvalidInput`.
pub async fn resolve_sponsorship(
    fee_payer: &dyn FeePayerService,
    config: &BridgeConfig,
    session_id: &str,
) -> Result<Option<Sponsorship>, BridgeError> {
    if !fee_payer.sponsorship_enabled(session_id.to_string()).await? {
        return Ok(None);
    }
    let payer = config.fee_payer()?.ok_or_else(|| BridgeError::InvalidInput {
        attribute: "fee_payer_address".to_string(),
        reason: "sponsorship is enabled but no fee payer is configured".to_string(),
    })?;
    let key_id = fee_payer
        .fetch_key_index(session_id.to_string(), payer.to_string())
        .await?;
    Ok(Some(Sponsorship { payer, key_id }))
}

fn wallet_substitutions(config: &BridgeConfig) -> Result<Substitutions, BridgeError> {
    Ok(Substitutions::new()
        .string(Token::Address, &config.wallet()?.to_string())
        .number(Token::KeyId, config.key_index)
        .string(Token::WalletName, &config.wallet_name)
        .string(Token::WalletIcon, &config.wallet_icon)
        .string(Token::Endpoint, &config.endpoint)
        .string(Token::AuthnUid, &config.uid(ServiceType::Authn.wire_name()))
        .string(Token::AuthzUid, &config.uid(ServiceType::Authz.wire_name()))
        .string(Token::PreAuthzUid, &config.uid(ServiceType::PreAuthz.wire_name()))
        .string(
            Token::UserSignatureUid,
            &config.uid(ServiceType::UserSignature.wire_name()),
        )
        .string(
            Token::AccountProofUid,
            &config.uid(ServiceType::AccountProof.wire_name()),
        ))
}

fn finish(rendered: String) -> Result<String, BridgeError> {
    let unresolved = unresolved_tokens(&rendered);
    if unresolved.is_empty() {
        Ok(rendered)
    } else {
        Err(BridgeError::SerializationError {
            error: format!("unresolved template tokens: {unresolved:?}"),
        })
    }
}

/// Pre-authz response naming the wallet as proposer and authorizer and the fee payer as
/// payer.
///
/// # Errors
/// Returns an error if the configured wallet address is invalid.
pub fn pre_authz_response(
    config: &BridgeConfig,
    sponsorship: Sponsorship,
) -> Result<String, BridgeError> {
    let subs = wallet_substitutions(config)?
        .string(Token::PayerAddress, &sponsorship.payer.to_string())
        .number(Token::PayerKeyId, sponsorship.key_id);
    finish(render(PRE_AUTHZ_TEMPLATE, &subs))
}

/// Authn response listing the wallet's services.
///
/// The pre-authz block is present only with `sponsorship`, the user-signature block only when
/// the config enables it and the account-proof block only with a signed challenge.
///
/// # Errors
/// Returns an error if the configured wallet address is invalid.
pub fn authn_response(
    config: &BridgeConfig,
    sponsorship: Option<Sponsorship>,
    account_proof: Option<&SignedAccountProof>,
) -> Result<String, BridgeError> {
    let mut subs = wallet_substitutions(config)?;

    let pre_authz = match sponsorship {
        Some(sponsorship) => {
            subs = subs
                .string(Token::PayerAddress, &sponsorship.payer.to_string())
                .number(Token::PayerKeyId, sponsorship.key_id);
            render(PRE_AUTHZ_FRAGMENT, &subs)
        }
        None => String::new(),
    };

    let user_signature = if config.user_signature_enabled {
        render(USER_SIGNATURE_FRAGMENT, &subs)
    } else {
        String::new()
    };

    let account_proof = match account_proof {
        Some(proof) => {
            subs = subs
                .string(Token::Nonce, &proof.nonce)
                .string(Token::Signature, &proof.signature);
            render(ACCOUNT_PROOF_FRAGMENT, &subs)
        }
        None => String::new(),
    };

    let subs = subs
        .raw(Token::PreAuthzService, pre_authz)
        .raw(Token::UserSignatureService, user_signature)
        .raw(Token::AccountProofService, account_proof);
    finish(render(AUTHN_TEMPLATE, &subs))
}

/// Standalone account-proof response.
///
/// # Errors
/// Returns an error if the configured wallet address is invalid.
pub fn account_proof_response(
    config: &BridgeConfig,
    proof: &SignedAccountProof,
) -> Result<String, BridgeError> {
    let subs = wallet_substitutions(config)?
        .string(Token::Nonce, &proof.nonce)
        .string(Token::Signature, &proof.signature);
    finish(render(ACCOUNT_PROOF_TEMPLATE, &subs))
}

fn signature_substitutions(signature: &CompositeSignature) -> Substitutions {
    Substitutions::new()
        .string(Token::Address, &signature.address.to_string())
        .number(Token::KeyId, signature.key_id)
        .string(Token::Signature, &signature.signature)
}

/// User-message signature response.
///
/// # Errors
/// Returns an error if a token is left unresolved.
pub fn user_signature_response(signature: &CompositeSignature) -> Result<String, BridgeError> {
    finish(render(
        USER_SIGNATURE_TEMPLATE,
        &signature_substitutions(signature),
    ))
}

/// Payload, envelope or single-signer authz response.
///
/// # Errors
/// Returns an error if a token is left unresolved.
pub fn authz_response(signature: &CompositeSignature) -> Result<String, BridgeError> {
    finish(render(AUTHZ_TEMPLATE, &signature_substitutions(signature)))
}
