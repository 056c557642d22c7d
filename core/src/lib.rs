pub mod collection;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod id;
mod ledger;
pub mod operation;
pub mod policy;
pub mod record;
pub mod task;

pub use collection::{Collection, Slot};
pub use config::EngineConfig;
pub use context::{Context, Role};
pub use engine::{Dispatched, OptimisticCollection, Settlement};
pub use error::{CollectionError, ConfigError, OperationFailed, RejectionKind, RemoteError};
pub use gateway::{Gateway, MemoryGateway, RemoteResponse, Scope};
pub use id::RecordId;
pub use operation::{OperationKind, OperationState};
pub use policy::{AccessDenied, PermissiveAgent, PolicyAgent, Resource, RolePolicy};
pub use record::Record;

pub use warroom_signals as signals;
