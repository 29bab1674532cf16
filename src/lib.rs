//! ColliCasa bot - Telegram front end for building access control
//!
//! Residents open the pedestrian and visitor gates and view camera snapshots
//! from a Telegram chat. The bot authenticates each Telegram user against the
//! access-control backend and relays their commands.
//!
//! ## Components
//!
//! - **Session**: per-user credential store with expiry
//! - **Gateway**: HTTP client for the access-control backend
//! - **Bot**: transport-independent command handling
//! - **Telegram**: Bot API client and long-polling loop

pub mod bot;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod telegram;
pub mod types;

pub use config::Args;
pub use types::{BotError, Result};
