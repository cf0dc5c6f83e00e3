//! Wallet-side bridge for the FCL (Flow Client Library) authorization protocol.
//!
//! A dApp running inside the wallet's embedded browser discovers the wallet's services and
//! then asks it to authenticate, authorize transactions and sign arbitrary messages. The
//! [`BrowserBridge`] receives the raw messages posted by the page, drives the signing protocol
//! and posts polling responses back into the page. Humans, keys and networks are reached
//! through foreign-implemented traits (see [`platform`]).
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Flow network a wallet or dApp operates on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Display,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Flow mainnet.
    Mainnet,
    /// Flow testnet.
    Testnet,
    /// Flow previewnet.
    Previewnet,
    /// A local emulator.
    Emulator,
}

mod error;
pub use error::*;

pub mod account_proof;
pub mod config;
pub mod defaults;
pub mod fee_payer;
pub mod logger;
pub mod platform;
pub mod primitives;
pub mod roles;
pub mod template;
pub mod wire;

mod session;
pub use session::{AuthzSubPhase, LinkAccountHandle, PendingAuthzTransaction, SessionPhase};

mod transport;
pub use transport::BrowserBridge;

// private modules
mod http_request;
mod orchestrator;

#[cfg(test)]
mod test_utils;

uniffi::setup_scaffolding!("fcl_bridge_core");
