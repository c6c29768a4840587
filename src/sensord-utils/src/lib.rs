//! Utilities shared by the sensord crates.
//!
//! Currently this only provides the `*_from_env_or!()` macros, which read build-time
//! configuration from environment variables in `const` context.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod env;
