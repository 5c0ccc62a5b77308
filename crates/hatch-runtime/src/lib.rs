//! Container creation pipeline for the Hatch runtime.
//!
//! Loads and validates a bundle's specification, converts it into an
//! engine-ready configuration, resolves the host's resource strategy, and
//! hands both to a [`backend::ContainerBackend`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod backend;
pub mod engine;
pub mod factory;
pub mod spec;
pub mod specconv;
pub mod state;
