//! Scope engine: targets, limitations and exclusions.
//!
//! A [`Scope`] records which devices a policy, profile or app applies to.
//! Human identifiers are resolved through a [`ScopeDirectory`] when members are
//! added, and evaluation asks the same directory for network segments and
//! directory-service group membership.
//!
//! # Example
//!
//! ```rust
//! use mdm_objects::config::ScopeConfig;
//! use mdm_objects::scope::{MemoryDirectory, Scope, ScopeKey, ScopeSubject, TargetKind};
//!
//! # fn main() -> Result<(), mdm_objects::error::ModelError> {
//! let directory = MemoryDirectory::new()
//!     .with_entity(ScopeKey::ComputerGroups, 12, "Lab Macs")
//!     .with_entity(ScopeKey::Computers, 40, "lab-40");
//!
//! let mut scope = Scope::new(TargetKind::Computers, ScopeConfig::default());
//! scope.add_target(&directory, ScopeKey::ComputerGroups, "Lab Macs")?;
//! scope.add_exclusion(&directory, ScopeKey::Computers, 40)?;
//!
//! let member = ScopeSubject::new(41).in_groups([12]);
//! let excluded = ScopeSubject::new(40).in_groups([12]);
//! assert!(scope.in_scope(&directory, &member)?);
//! assert!(!scope.in_scope(&directory, &excluded)?);
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod evaluation;
pub mod keys;
pub mod network;
#[allow(clippy::module_inception)]
pub mod scope;


pub use directory::{CachedDirectory, MemoryDirectory, ScopeDirectory};
pub use evaluation::ScopeSubject;
pub use keys::{Partition, ScopeId, ScopeKey, TargetKind};
pub use network::NetworkSegment;
pub use scope::{Scope, ScopeOwner};
