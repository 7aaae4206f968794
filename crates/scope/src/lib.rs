#![forbid(unsafe_code)]

pub mod audit;
pub mod cache;
pub mod clock;
pub mod error;
pub mod exclusion;
pub mod exclusion_set;
pub mod mounts;
pub mod planner;
pub mod walk;

pub use audit::{AuditEvent, RecordingAudit, ScanAudit, TracingAudit};
pub use cache::ExclusionCache;
pub use clock::{Clock, SystemClock};
pub use error::Error;
pub use exclusion::{Exclusion, ExclusionKind};
pub use exclusion_set::ExclusionSet;
pub use mounts::{DeviceKind, MountPoint, MountRecord, ProcfsMounts};
pub use planner::{InclusionController, InclusionRoot, RootKind};
pub use walk::{ScopeWalker, WalkReport};
