//! REST API handlers

pub mod health;
pub mod jobs;
pub mod plans;
pub mod shared;
pub mod subscriptions;

pub use health::*;
pub use jobs::*;
pub use plans::*;
pub use subscriptions::*;
