//! Bot core
//!
//! Transport-independent handling of user actions: parse a command into an
//! [`Action`], run it through the [`Dispatcher`], deliver the [`Reply`]s.

pub mod action;
pub mod dispatcher;
pub mod messages;

pub use action::Action;
pub use dispatcher::{Dispatcher, Reply, ReplySink, UserInfo};
