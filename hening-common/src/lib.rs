//! # Hening Common Library
//!
//! Shared code for the Hening meditation engine crates including:
//! - Session phases and bell offsets
//! - Event types (SessionEvent enum) and the observable session snapshot
//! - Configuration file discovery
//! - Countdown formatting for host views

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::{Offset, SessionEvent, SessionPhase, SessionSnapshot};
