//! Workload dimensions: which entities are exercised, with which operations,
//! and at which sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default workload sizes, visited in this order.
pub const DEFAULT_SIZES: [usize; 6] = [10, 50, 100, 200, 500, 1000];

/// Kind of entity the target service manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Todo,
    Project,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "todos" => Ok(Self::Todo),
            "project" | "projects" => Ok(Self::Project),
            other => Err(CoreError::UnknownObjectType(other.to_string())),
        }
    }
}

/// A timed unit of remote work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// All operations in their canonical order.
    pub const ALL: [OperationKind; 3] = [Self::Create, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the operation acts on entities that must be created first.
    pub fn requires_existing(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(CoreError::UnknownOperation(other.to_string())),
        }
    }
}

/// Identifies one (object type, operation, workload size) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub object_type: ObjectType,
    pub operation: OperationKind,
    pub workload_size: usize,
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}",
            self.object_type, self.operation, self.workload_size
        )
    }
}

/// The matrix of runs an experiment suite executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Workload sizes in the order they are visited (not necessarily sorted)
    pub sizes: Vec<usize>,

    /// Operations in the order they are visited
    pub operations: Vec<OperationKind>,

    /// Object types in the order they are visited
    pub object_types: Vec<ObjectType>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            operations: OperationKind::ALL.to_vec(),
            object_types: vec![ObjectType::Todo],
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.sizes.is_empty() {
            return Err(CoreError::validation("workload.sizes must not be empty"));
        }
        if let Some(pos) = self.sizes.iter().position(|&size| size == 0) {
            return Err(CoreError::validation(format!(
                "workload.sizes[{}] must be > 0",
                pos
            )));
        }
        if self.operations.is_empty() {
            return Err(CoreError::validation(
                "workload.operations must not be empty",
            ));
        }
        if self.object_types.is_empty() {
            return Err(CoreError::validation(
                "workload.object_types must not be empty",
            ));
        }
        Ok(())
    }

    /// Runs in execution order: object types, then operations, then sizes,
    /// each in declared order.
    pub fn runs(&self) -> impl Iterator<Item = RunKey> + '_ {
        self.object_types.iter().flat_map(move |&object_type| {
            self.operations.iter().flat_map(move |&operation| {
                self.sizes.iter().map(move |&workload_size| RunKey {
                    object_type,
                    operation,
                    workload_size,
                })
            })
        })
    }

    /// Total number of runs in the matrix.
    pub fn run_count(&self) -> usize {
        self.sizes.len() * self.operations.len() * self.object_types.len()
    }
}
