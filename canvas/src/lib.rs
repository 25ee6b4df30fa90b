//! Pixel-art editing core for Drawwy.
//!
//! This crate has no I/O. It owns the artwork model and every rule about how
//! it may change: single-cell painting with undo/redo, whole-grid replacement,
//! and the reconciliation of untrusted AI output into a strict command. The
//! server uses it to validate model responses; the terminal client uses it
//! to run the editing session.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`grid`] | Square color grid, sizes and hex-color check |
//! | [`history`] | Bounded past/present/future snapshot stacks |
//! | [`input`] | Tools and the paint-stroke state machine |
//! | [`editor`] | Pixel mutation controller; the only owner of grid + history |
//! | [`protocol`] | JSON wire types for the AI endpoint |
//! | [`command`] | Model text to validated [`command::AiCommand`] |
//! | [`chat`] | Conversation state and the single-request policy |
//! | [`consts`] | Colors, palette, history cap, fixed messages |

pub mod chat;
pub mod command;
pub mod consts;
pub mod editor;
pub mod grid;
pub mod history;
pub mod input;
pub mod protocol;
