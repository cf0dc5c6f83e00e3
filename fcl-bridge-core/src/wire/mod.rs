//! Typed representations of the messages exchanged with the embedded page.
//!
//! Decoding never panics: malformed payloads become [`BridgeError::Decode`] and unknown
//! fields are ignored so newer FCL versions keep working.

mod requests;
mod service;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use requests::*;
pub use service::*;

use crate::{
    defaults::{FCL_VIEW_READY_RESPONSE, SERVICE_F_TYPE},
    error::BridgeError,
};

/// An inbound message on the generic channel, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A service the dApp wants to execute next. Answered with a ready acknowledgement.
    ServiceDiscovery(Service),
    /// The page's answer to the ready acknowledgement, carrying the phase payload.
    PhaseResponse(PhaseResponse),
    /// Anything else; dropped.
    Unrecognized,
}

impl InboundMessage {
    /// Classifies a raw JSON message.
    ///
    /// A message is service discovery when it has no top-level `type` and carries a
    /// `service` object with either a `type` or `f_type == "Service"`. It is a phase response
    /// when its `type` is `FCL:VIEW:READY:RESPONSE`.
    ///
    /// # Errors
    /// Returns `BridgeError::Decode` if the message is not a JSON object or a recognized
    /// shape fails to decode.
    pub fn classify(raw: &str) -> Result<Self, BridgeError> {
        let value: Value = serde_json::from_str(raw)?;
        let Some(object) = value.as_object() else {
            return Err(BridgeError::Decode {
                error: "page message is not a JSON object".to_string(),
            });
        };

        match object.get("type") {
            None => {
                let Some(service) = object.get("service").and_then(Value::as_object)
                else {
                    return Ok(Self::Unrecognized);
                };
                let is_service = service.contains_key("type")
                    || service.get("f_type").and_then(Value::as_str)
                        == Some(SERVICE_F_TYPE);
                if !is_service {
                    return Ok(Self::Unrecognized);
                }
                let service = serde_json::from_value(Value::Object(service.clone()))?;
                Ok(Self::ServiceDiscovery(service))
            }
            Some(Value::String(kind)) if kind == FCL_VIEW_READY_RESPONSE => {
                Ok(Self::PhaseResponse(serde_json::from_value(value)?))
            }
            Some(_) => Ok(Self::Unrecognized),
        }
    }
}

/// A phase response decoded according to its service type.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseRequest {
    /// Authentication, optionally with an account-proof challenge.
    Authn(AuthnRequest),
    /// Standalone account-proof challenge.
    AccountProof(AuthnRequest),
    /// Transaction authorization.
    Authz(AuthzRequest),
    /// User message signature.
    UserSignature(UserSignatureRequest),
}

impl PhaseRequest {
    /// Decodes the body of `response` as a request for `service_type`.
    ///
    /// # Errors
    /// Returns `BridgeError::Decode` if the body does not match the phase or the phase has
    /// no page-driven request (pre-authz, unknown).
    pub fn decode(
        service_type: ServiceType,
        response: &PhaseResponse,
    ) -> Result<Self, BridgeError> {
        match service_type {
            ServiceType::Authn => Ok(Self::Authn(decode_body(response)?)),
            ServiceType::AccountProof => Ok(Self::AccountProof(decode_body(response)?)),
            ServiceType::Authz => Ok(Self::Authz(decode_body(response)?)),
            ServiceType::UserSignature => {
                let mut request: UserSignatureRequest = decode_body(response)?;
                let app = response.app_info();
                request.app_title = app.title;
                request.app_icon = app.icon;
                Ok(Self::UserSignature(request))
            }
            ServiceType::PreAuthz | ServiceType::Unknown => Err(BridgeError::Decode {
                error: format!("no phase request for service type {service_type}"),
            }),
        }
    }

    /// The phase this request belongs to.
    #[must_use]
    pub const fn service_type(&self) -> ServiceType {
        match self {
            Self::Authn(_) => ServiceType::Authn,
            Self::AccountProof(_) => ServiceType::AccountProof,
            Self::Authz(_) => ServiceType::Authz,
            Self::UserSignature(_) => ServiceType::UserSignature,
        }
    }

    /// Deduplication key of this request.
    #[must_use]
    pub fn unique_id(&self, response_type: &str) -> UniqueId {
        let roles = match self {
            Self::Authz(request) => Some(request.roles),
            _ => None,
        };
        UniqueId::new(self.service_type(), response_type, roles)
    }
}

fn decode_body<T: DeserializeOwned>(response: &PhaseResponse) -> Result<T, BridgeError> {
    serde_json::from_value(response.body.clone()).map_err(|e| BridgeError::Decode {
        error: format!("invalid phase body: {e}"),
    })
}

/// Deduplication key of a phase response: service type, response type and, for authz, the
/// role vector. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueId(String);

impl UniqueId {
    /// Builds the key.
    #[must_use]
    pub fn new(service_type: ServiceType, response_type: &str, roles: Option<Roles>) -> Self {
        let mut id = format!("{service_type}|{response_type}");
        if let Some(roles) = roles {
            id.push_str(&format!(
                "|{}{}{}",
                u8::from(roles.proposer),
                u8::from(roles.authorizer),
                u8::from(roles.payer)
            ));
        }
        Self(id)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
