//! Shared helpers for adn-conv

pub mod db_retry;

pub use db_retry::{is_transient, retry_transient};
