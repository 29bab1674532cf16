//! Backend gateway
//!
//! Thin async client for the access-control backend:
//!
//! - **verify_identity**: exchange a Telegram id for a user token (service credential)
//! - **open_gate**: open the pedestrian or visitor gate (user credential)
//! - **get_snapshot**: fetch a camera image (user credential)
//! - **health_check**: probe `/health` (service credential)
//!
//! All failures come back as [`GatewayError`]; nothing is retried.

pub mod client;
pub mod error;
pub mod types;

pub use client::{BackendGateway, GatewayConfig, DEFAULT_REQUEST_TIMEOUT, TENANT_HEADER};
pub use error::{mentions_permission, GatewayError};
pub use types::{CameraKind, GateKind, IdentityPayload};
