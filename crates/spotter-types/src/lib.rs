//! Spotter Types - Shared domain types
//!
//! This crate contains domain types used across Spotter crates:
//! - Member identity
//! - Plan catalog entries and plan roles
//! - Subscriptions, their lifecycle status and request modes
//! - Plan availability decoration

pub mod availability;
pub mod error;
pub mod plan;
pub mod subscription;
pub mod user;

pub use availability::*;
pub use error::*;
pub use plan::*;
pub use subscription::*;
pub use user::*;
