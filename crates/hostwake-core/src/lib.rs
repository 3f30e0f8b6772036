//! Core types and utilities for hostwake.
//!
//! This crate provides the foundational types used throughout the hostwake bot:
//!
//! - **Identifiers**: chat IDs and normalized usernames
//! - **Roles**: the admin/user split of the operator directory
//! - **Host values**: MAC addresses and OS hints for the controlled host
//! - **Error types**: parse errors shared across crates
//!
//! # Example
//!
//! ```
//! use hostwake_core::{MacAddress, Role, Username};
//!
//! let user = Username::parse("@Alice").unwrap();
//! assert_eq!(user.as_str(), "alice");
//!
//! let role: Role = " Admin ".parse().unwrap();
//! assert_eq!(role, Role::Admin);
//!
//! let mac: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
//! assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod mac;
pub mod role;

pub use error::{IdError, Result};
pub use ids::{ChatId, Username};
pub use mac::MacAddress;
pub use role::{OsHint, Role};
