//! # ADN Common Library
//!
//! Shared code for ADN services:
//! - Error type
//! - Configuration loading and root folder resolution
//! - Job event types and EventBus
//! - SSE streaming helper
//! - Time and UUID utilities

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
