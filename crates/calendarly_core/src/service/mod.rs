//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate engine and store calls into intent-level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod filter;
pub mod scheduling_service;
