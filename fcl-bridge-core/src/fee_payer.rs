//! HTTP fee payer backed by the Flow REST access API and a remote payer-signing endpoint.
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::BridgeError,
    http_request::{ensure_secure_url, HttpClient},
    platform::{FeePayerService, RemoteSignature},
    primitives::{FlowAddress, ParseFromForeignBinding},
    Network,
};

/// Account as returned by `GET /v1/accounts/{address}?expand=keys`.
#[derive(Debug, Clone, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountKey {
    /// Decimal string in the REST API.
    index: String,
    #[serde(default)]
    revoked: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct SignAsPayerResponse {
    #[serde(rename = "envelopeSigs")]
    envelope_sigs: EnvelopeSig,
}

#[derive(Debug, Clone, Deserialize)]
struct EnvelopeSig {
    sig: String,
    address: String,
    #[serde(rename = "keyId")]
    key_id: u32,
}

impl AccountResponse {
    fn first_usable_key(&self) -> Option<u32> {
        self.keys
            .iter()
            .filter(|key| !key.revoked)
            .find_map(|key| key.index.parse().ok())
    }
}

/// Fee payer reached over HTTPS.
#[derive(uniffi::Object)]
pub struct HttpFeePayer {
    access_node_url: String,
    signer_url: String,
    sponsorship_enabled: bool,
    http: HttpClient,
    signing_http: HttpClient,
}

#[uniffi::export]
impl HttpFeePayer {
    /// Creates a fee payer for `network` whose envelopes are signed by `signer_url`.
    ///
    /// # Errors
    /// `BridgeError::InvalidInput` if `signer_url` is not https (plain http only on loopback).
    #[uniffi::constructor]
    pub fn new(
        network: Network,
        signer_url: String,
        sponsorship_enabled: bool,
    ) -> Result<Self, BridgeError> {
        Self::with_access_node(
            network.access_node_url().to_string(),
            signer_url,
            sponsorship_enabled,
        )
    }

    /// Creates a fee payer using a custom access node.
    ///
    /// # Errors
    /// `BridgeError::InvalidInput` if either url is not https (plain http only on loopback).
    #[uniffi::constructor]
    pub fn with_access_node(
        access_node_url: String,
        signer_url: String,
        sponsorship_enabled: bool,
    ) -> Result<Self, BridgeError> {
        ensure_secure_url(&access_node_url, "access_node_url")?;
        ensure_secure_url(&signer_url, "signer_url")?;
        Ok(Self {
            access_node_url: access_node_url.trim_end_matches('/').to_string(),
            signer_url,
            sponsorship_enabled,
            http: HttpClient::new(),
            signing_http: HttpClient::with_timeout(Duration::from_secs(30)),
        })
    }
}

#[async_trait::async_trait]
impl FeePayerService for HttpFeePayer {
    async fn sponsorship_enabled(&self, _session_id: String) -> Result<bool, BridgeError> {
        Ok(self.sponsorship_enabled)
    }

    async fn fetch_key_index(
        &self,
        session_id: String,
        address: String,
    ) -> Result<u32, BridgeError> {
        let address = FlowAddress::parse_from_ffi(&address, "address")?;
        let url = format!(
            "{}/v1/accounts/{}?expand=keys",
            self.access_node_url,
            address.sans_prefix()
        );
        log::debug!("[{session_id}] fetching fee payer keys for {address}");

        let response = self.http.send(self.http.get(&url)).await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BridgeError::NetworkError {
                url,
                status: Some(status.as_u16()),
                error: format!("account lookup failed: {error_body}"),
            });
        }

        let account: AccountResponse =
            response
                .json()
                .await
                .map_err(|e| BridgeError::SerializationError {
                    error: format!("failed to parse account response: {e}"),
                })?;
        account.first_usable_key().ok_or_else(|| BridgeError::NetworkError {
            url,
            status: Some(status.as_u16()),
            error: format!("account {address} has no usable key"),
        })
    }

    async fn sign_envelope(
        &self,
        session_id: String,
        voucher_json: String,
        envelope_message: String,
    ) -> Result<RemoteSignature, BridgeError> {
        let voucher: Value = serde_json::from_str(&voucher_json).map_err(|e| {
            BridgeError::InvalidInput {
                attribute: "voucher".to_string(),
                reason: e.to_string(),
            }
        })?;
        let body = json!({
            "transaction": voucher,
            "message": { "envelope_message": envelope_message },
        });

        let request = self
            .signing_http
            .post(&self.signer_url)
            .header("X-Session-Id", session_id.as_str())
            .json(&body);
        let response = self
            .signing_http
            .send(request)
            .await
            .map_err(|e| BridgeError::RemoteSigningFailure {
                error: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BridgeError::RemoteSigningFailure {
                error: format!("fee payer returned {}: {error_body}", status.as_u16()),
            });
        }

        let signed: SignAsPayerResponse =
            response
                .json()
                .await
                .map_err(|e| BridgeError::RemoteSigningFailure {
                    error: format!("failed to parse fee payer response: {e}"),
                })?;
        log::info!(
            "[{session_id}] fee payer {} countersigned envelope",
            signed.envelope_sigs.address
        );
        Ok(RemoteSignature {
            address: signed.envelope_sigs.address,
            key_id: signed.envelope_sigs.key_id,
            signature: signed.envelope_sigs.sig,
        })
    }
}
