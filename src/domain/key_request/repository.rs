//! Key request repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{KeyRequest, KeyRequestId};
use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Repository trait for key request storage
///
/// The decision transitions are conditional updates: under concurrent
/// approvals of the same request, exactly one caller succeeds and the rest
/// observe `AlreadyApproved`. That guarantee lives here, not in callers.
#[async_trait]
pub trait KeyRequestRepository: Send + Sync + Debug {
    /// Persist a newly submitted request
    async fn create(&self, request: KeyRequest) -> Result<KeyRequest, DomainError>;

    /// Get a request by its ID
    async fn get(&self, id: &KeyRequestId) -> Result<Option<KeyRequest>, DomainError>;

    /// List all requests, newest first
    async fn list(&self) -> Result<Vec<KeyRequest>, DomainError>;

    /// Conditionally transition `Pending -> Approved`, recording the key
    ///
    /// Errors: `NotFound` if the request is absent, `AlreadyApproved` if it
    /// is approved, `Conflict` if it was rejected.
    async fn mark_approved(
        &self,
        id: &KeyRequestId,
        api_key_id: &ApiKeyId,
    ) -> Result<KeyRequest, DomainError>;

    /// Conditionally transition `Pending -> Rejected`
    ///
    /// Re-rejecting an already rejected request returns it unchanged; the
    /// boolean distinguishes a real transition from that no-op. Rejecting an
    /// approved request is a `Conflict`.
    async fn mark_rejected(&self, id: &KeyRequestId)
        -> Result<(KeyRequest, bool), DomainError>;
}
