//! Core logic for lvm
//!
//! Turns a service definition plus runtime flags into a container invocation
//! and drives that invocation through a [`lvm_provider::ContainerRunner`].

mod error;
mod flags;
mod image;
mod invocation;
mod lifecycle;
mod registry;

pub use error::*;
pub use flags::*;
pub use image::*;
pub use invocation::*;
pub use lifecycle::*;
pub use registry::*;

#[cfg(feature = "test-support")]
pub mod test_support;
