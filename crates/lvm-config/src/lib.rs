//! Configuration parsing for lvm
//!
//! This crate handles:
//! - Service definitions (`[services.<name>]` tables in `lvm.toml` / `lvm.json`)
//! - Runtime selection (`[runtime]`)
//! - The process [`Environment`] (home and cache directories)

mod environment;
mod error;
mod global;
mod service;

pub use environment::*;
pub use error::*;
pub use global::*;
pub use service::*;
