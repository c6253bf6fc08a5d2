//! Concrete provider adapters.

#[cfg(feature = "provider-proxy")]
pub mod proxy;
