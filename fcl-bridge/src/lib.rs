//! Foreign-language facade for [`fcl_bridge_core`].
//!
//! Swift and Kotlin builds link this crate; it re-exports the core scaffolding so a
//! single library exposes every bridge type.

fcl_bridge_core::uniffi_reexport_scaffolding!();

pub use fcl_bridge_core::*;
