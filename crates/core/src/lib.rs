//! Checkmark Core - Shared types library.
//!
//! This crate provides the types shared by the Checkmark components:
//! - `server` - Slack webhook receiver and completion workflow
//! - `integration-tests` - End-to-end scenarios against in-memory services
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Locating an item inside a document snapshot and building the edit
//! that marks it complete both live here so they can be tested without any
//! remote service.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, document snapshots, edit batches, and outcomes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
