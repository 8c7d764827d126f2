//! # connector-core
//!
//! The privileged half of the connector, minus the transport:
//! - **Validator**: the mount command grammar, the daemon's only security
//!   boundary.
//! - **Executor**: direct process execution of accepted commands, never
//!   through a shell.
//! - **Socket path**: preparation of the bind point at startup.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod executor;
pub mod socket_path;
pub mod validator;
