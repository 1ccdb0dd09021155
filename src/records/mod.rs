//! Accumulating generation records: lesson plans and creative writing.
//!
//! A record is created from one generation and then only ever extended by
//! follow-ups appended to its content.

pub mod handlers;
pub mod models;
pub mod service;

pub use service::{ContentService, FollowUpPolicy, FOLLOW_UP_SEPARATOR};
