//! Authentication middleware for the admin API

pub mod admin_auth;

pub use admin_auth::AdminIdentity;
