//! Shared utilities and common types for the Serve backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT bearer-token verification (Auth0-style)
//! - Common validation logic

pub mod jwt;
pub mod validation;
