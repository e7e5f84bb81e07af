//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Angel Event client core:
//! - Logging and tracing infrastructure
//! - Configuration management and host capability wiring
//! - Event bus system
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its error
//! conventions, logging setup and event broadcasting. Nothing here knows about
//! sessions or routes; those live in `core-auth`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
