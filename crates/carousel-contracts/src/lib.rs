//! # carousel-contracts
//!
//! Shared types, messages, errors, and scenario configuration for the
//! carousel production-line simulator.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and their invariants.

pub mod config;
pub mod error;
pub mod item;
pub mod message;
pub mod recipe;
pub mod robot;
