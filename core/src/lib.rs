//! Typed JSON serializer contract for the client side of an RPC layer.

extern crate self as jsonwire_core_rs;

pub mod serialization;

pub use serialization::*;

// Re-exports for derive macros
pub use jsonwire_derive_rs::{JsonBean, JsonEnum};

#[doc(hidden)]
pub mod __private {
  pub use serde_json::Value;
}
