//! Holds per-trait registries and models the page-load delivery contract.
//!
//! The hub lets callers resolve implementor records using the trait path an
//! asset was scanned under, keeping trait selection explicit even when many
//! assets from one doc tree are loaded. The bus mirrors how a rendered page
//! receives a registry: a hook consumes it immediately when attached,
//! otherwise the registry parks in a single pending slot until pickup.

use crate::registry::identity::{CrateName, TraitPath};
use crate::registry::model::{ImplementorRecord, ImplementorRegistry};
use std::collections::BTreeMap;

#[derive(Default)]
/// In-memory store for implementor registries keyed by `TraitPath`.
pub struct RegistryHub {
    registries: BTreeMap<TraitPath, ImplementorRegistry>,
}

impl RegistryHub {
    /// Register a trait's registry for later lookup.
    ///
    /// A registry already held under the trait path absorbs the new one, with
    /// the new crate entries winning on overlap.
    pub fn register(&mut self, trait_path: TraitPath, registry: ImplementorRegistry) {
        self.registries
            .entry(trait_path)
            .or_default()
            .absorb(registry);
    }

    /// Fetch a trait's registry by path, if present.
    pub fn get(&self, trait_path: &TraitPath) -> Option<&ImplementorRegistry> {
        self.registries.get(trait_path)
    }

    /// Resolve the records one crate registered for a trait.
    pub fn find_records(
        &self,
        trait_path: &TraitPath,
        name: &CrateName,
    ) -> Option<&[ImplementorRecord]> {
        self.get(trait_path)?.records_for(name)
    }

    /// Iterates trait paths in stable order.
    pub fn trait_paths(&self) -> impl Iterator<Item = &TraitPath> {
        self.registries.keys()
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

/// Callback invoked with each delivered registry once a consumer attaches.
pub type RegistryHook = Box<dyn FnMut(ImplementorRegistry)>;

#[derive(Default)]
/// Delivery path for a loaded registry: hook when attached, pending otherwise.
///
/// The pending slot holds at most one registry; a second delivery before any
/// consumer attaches replaces the first, matching the overwrite semantics of
/// the slot the asset assigns on a page without the hook installed.
pub struct RegistrationBus {
    hook: Option<RegistryHook>,
    pending: Option<ImplementorRegistry>,
}

impl RegistrationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a registry: straight to the hook if attached, else park it.
    pub fn deliver(&mut self, registry: ImplementorRegistry) {
        match self.hook.as_mut() {
            Some(hook) => hook(registry),
            None => self.pending = Some(registry),
        }
    }

    /// Attach the consumer hook, draining any parked registry into it first.
    pub fn attach(&mut self, mut hook: RegistryHook) {
        if let Some(parked) = self.pending.take() {
            hook(parked);
        }
        self.hook = Some(hook);
    }

    /// Take the parked registry without attaching a hook.
    pub fn take_pending(&mut self) -> Option<ImplementorRegistry> {
        self.pending.take()
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
