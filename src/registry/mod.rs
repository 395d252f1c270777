//! Implementor registry wiring.
//!
//! This module holds the typed form of an implementors payload so helpers can
//! load a validated snapshot and expose consistent identifiers. Types here
//! mirror the payload fields; callers use `RegistryIndex` for validated
//! lookups and `RegistryHub` when assets for multiple traits are loaded.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{CrateName, TargetKind, TraitPath, TypePath};
pub use index::{RegistryIndex, validate_payload_value};
pub use model::{ImplementorRecord, ImplementorRegistry, load_registry_from_path};
pub use repository::{RegistrationBus, RegistryHook, RegistryHub};
