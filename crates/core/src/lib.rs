//! # shadowpack-core
//!
//! Package relocation for shaded JVM archives.
//!
//! A [`RelocationPlan`] is built from ordered [`RelocationRule`]s and applied to
//! one [`ArchiveEntry`] at a time. Relocation moves entry paths and rewrites the
//! class references inside class files, service descriptors and the manifest,
//! so the relocated archive stays self-consistent.

pub mod archive;
mod class_file;
pub mod config;
pub mod entry;
pub mod error;
mod exclude;
pub mod plan;
pub mod relocation_report;
mod resource;
pub mod rule;
pub mod scan;

pub use archive::{EntrySink, EntrySource};
pub use config::Config;
pub use entry::{ArchiveEntry, EntryKind};
pub use error::{ClassFormatError, InvalidRuleError, RelocateError, RuleField};
pub use plan::{PlanWarning, RelocationPlan, build_plan};
pub use relocation_report::{RelocatedPath, RelocationReport};
pub use rule::RelocationRule;
pub use scan::{BadCall, BadCallScanner};
