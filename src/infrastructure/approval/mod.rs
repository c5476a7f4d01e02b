//! Approval workflow infrastructure

mod service;

pub use service::{
    ApprovalOutcome, ApprovalService, NewKeyRequest, RejectionOutcome, SubmissionOutcome,
};
