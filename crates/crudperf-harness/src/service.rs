//! The boundary between the harness and the system under test.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use crudperf_core::ObjectType;
use thiserror::Error;

/// Opaque identifier of an entity created on the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Result of one operation that reached the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded {
        /// Identifier of the created entity, when the operation creates one
        id: Option<EntityId>,
    },
    /// The target answered but rejected the operation.
    Failed { reason: String },
}

impl OperationOutcome {
    pub fn created(id: impl Into<EntityId>) -> Self {
        Self::Succeeded {
            id: Some(id.into()),
        }
    }

    pub fn succeeded() -> Self {
        Self::Succeeded { id: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Failure that makes continuing the current run pointless.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("target unreachable: {0}")]
    Unreachable(String),
}

pub type OperationResult = Result<OperationOutcome, OperationError>;

/// Remote CRUD service the driver measures.
///
/// Calls are issued sequentially by the driver; implementations decide
/// their own transport and payloads.
#[async_trait]
pub trait TargetService: Send + Sync {
    /// Create a fresh entity, returning its identifier on success.
    async fn create(&self, object_type: ObjectType) -> OperationResult;

    /// Modify an existing entity.
    async fn update(&self, object_type: ObjectType, id: &EntityId) -> OperationResult;

    /// Remove an existing entity.
    async fn delete(&self, object_type: ObjectType, id: &EntityId) -> OperationResult;
}

#[async_trait]
impl<T: TargetService + ?Sized> TargetService for Arc<T> {
    async fn create(&self, object_type: ObjectType) -> OperationResult {
        (**self).create(object_type).await
    }

    async fn update(&self, object_type: ObjectType, id: &EntityId) -> OperationResult {
        (**self).update(object_type, id).await
    }

    async fn delete(&self, object_type: ObjectType, id: &EntityId) -> OperationResult {
        (**self).delete(object_type, id).await
    }
}
