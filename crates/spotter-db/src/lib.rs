//! Spotter DB - Database abstractions
//!
//! SQLx-based persistence for plans, subscriptions, payments and sales.
//!
//! # Example
//!
//! ```rust,ignore
//! use spotter_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/spotter").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let plans = repos.plans.list().await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, run_migrations, DbPool};
pub use repo::*;
