//! # carousel-ring
//!
//! The shared circular production line: slot storage, the connection table,
//! the rotation permutation, and the admission position scan.
//!
//! This crate holds no locks and spawns no threads — it is the data
//! structure the runtime serializes access to. See `carousel-runtime` for
//! the mutual-exclusion contract.

pub mod admission;
pub mod ring;

pub use admission::assign_position;
pub use ring::{Occupant, Ring};
