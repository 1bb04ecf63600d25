//! redeem-server — package stock and share-code service
//!
//! Issues single-use redemption codes ("stock") tied to purchasable
//! packages, and short numeric share codes that bind a buyer session to
//! exactly one stock unit.
//!
//! Module structure:
//!
//! ```text
//! redeem-server/src/
//! ├── config.rs      # environment configuration
//! ├── state.rs       # shared AppState (PgPool + settings)
//! ├── error.rs       # service-layer error bridging
//! ├── codec.rs       # order-number / share-code formats, expiry derivation
//! ├── alloc.rs       # bounded retry-on-collision key allocation
//! ├── binder.rs      # transactional share-code ↔ stock binding
//! ├── auth/          # admin JWT authentication
//! ├── db/            # PostgreSQL access layer
//! └── api/           # HTTP routes and handlers
//! ```

pub mod alloc;
pub mod api;
pub mod auth;
pub mod binder;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod util;
