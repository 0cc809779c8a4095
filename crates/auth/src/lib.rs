//! OpenID Connect sign-in for the oidc-webapp sample.
//!
//! This crate provides:
//! - OIDC client configuration, discovery and response validation
//! - Per-request state/nonce contexts, optionally kept in encrypted cookies
//! - A user directory with auto-registration on first sign-in
//! - Session identity serialization

mod context;
mod cookie;
mod directory;
mod error;
mod id_token;
mod oidc;
mod profile;
mod serializer;
mod strategy;

pub use context::*;
pub use cookie::*;
pub use directory::*;
pub use error::*;
pub use id_token::*;
pub use oidc::*;
pub use profile::*;
pub use serializer::*;
pub use strategy::*;
