// SPDX-License-Identifier: MIT

//! Engine-facing contracts: errors, the instance model, and the two external
//! collaborators (instance storage and assignment resolution).

pub mod assign;
pub mod error;
pub mod instance;
pub mod repository;

pub use assign::AssignmentResolver;
pub use error::{EngineError, RepositoryError, WorkflowError};
pub use instance::{DataId, Instance, InstanceId, Status, UserId};
pub use repository::{InstanceFilter, InstanceRepository};
