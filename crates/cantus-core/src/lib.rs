//! Core domain model for cantus.
//!
//! This crate defines the choir data model (singers, songs, setlists,
//! events and attendance, user accounts), the SQLite schema with its
//! foreign-key policies, and the flows built directly on top of it:
//! invite-guarded registration and bulk song import.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod credentials;
pub mod error;
pub mod import;
pub mod model;
pub mod registration;
pub mod schema;

pub use error::{Error, ErrorKind, InviteRejection, Result};
