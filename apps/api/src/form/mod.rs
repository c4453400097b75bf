//! Client side of the upload flow: form state, validation, submission lifecycle.
//!
//! The state machine in [`state`] is pure. [`controller::FormController`] owns one
//! and performs the side effects it asks for: sending the upload, rotating the
//! loading message while it is in flight, and saving a returned PDF.

pub mod cli;
pub mod controller;
pub mod download;
pub mod messages;
pub mod state;
pub mod transport;
pub mod validation;
