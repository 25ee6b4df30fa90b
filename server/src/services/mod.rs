//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the external calls (LLM, storage network, indexer)
//! behind traits, so route handlers stay focused on protocol translation.

pub mod ai;
pub mod gallery;
pub mod publish;
