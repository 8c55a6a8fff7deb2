// Job Escrow Library - escrow-backed job lifecycle between a client and a freelancer
// This exposes the core components for testing and integration

pub mod actions;
pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod escrow;
pub mod jobs;
pub mod repository;
pub mod service;
pub mod telemetry;

// Re-export key types for easy access
pub use actions::{dispatch, ActionRequest, ActionResponse, ErrorBody};
pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use config::{config, JobEscrowConfig};
pub use errors::{ErrorKind, EscrowError};
pub use escrow::{EscrowCoordinator, EscrowSettings, InstructionKind, UnsignedInstruction};
pub use jobs::{ActionKind, Job, JobFilter, JobStatus, NewJob};
pub use repository::{FileJobRepository, InMemoryJobRepository, JobRepository, StorageError};
pub use service::JobService;
pub use telemetry::{create_action_span, generate_correlation_id, init_telemetry};
