//! # Graft Support
//!
//! Shared utilities for the Graft dependency injector.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Common utilities shared between graft crates

pub mod rendering;
