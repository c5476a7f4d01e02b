//! Key request domain
//!
//! A key request is a submitted application for an API key. It moves through
//! a one-way state machine: pending, then approved or rejected, exactly once.

mod entity;
mod repository;

pub use entity::{KeyRequest, KeyRequestId, KeyRequestStatus};
pub use repository::KeyRequestRepository;
