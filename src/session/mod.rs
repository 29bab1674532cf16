//! Per-user session storage
//!
//! Verified Telegram users get a backend bearer token which is kept in memory
//! until it expires. Nothing is persisted: a restart drops every session and
//! users simply run /start again.

pub mod store;

pub use store::{
    CredentialRecord, SessionStats, SessionStatsSnapshot, SessionStore, DEFAULT_SESSION_TTL,
};
