//! Shared foundational types used across the Ferrite timing-repair toolchain.
//!
//! This crate provides the internal-error result type, content hashing for
//! netlist fingerprints, integer database-unit geometry, and SI unit helpers.

#![warn(missing_docs)]

pub mod geom;
pub mod hash;
pub mod result;
pub mod units;

pub use geom::{Dbu, Point, Rect};
pub use hash::ContentHash;
pub use result::{FerriteResult, InternalError};
