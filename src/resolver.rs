//! Interface resolution and implementation overrides.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use wired_core::{Instance, TypeKey};

use crate::registry::Registry;

/// Implementation overrides, keyed by consumer type.
///
/// A consumer holds at most one override: it applies to every ambiguous interface field
/// the consumer declares.
#[derive(Debug, Default)]
pub struct Overrides {
    map: RwLock<BTreeMap<TypeId, (TypeKey, TypeKey)>>,
}

impl Overrides {
    pub const fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
        }
    }

    /// Pins `implementation` for `consumer`, returning the implementation it replaces.
    pub fn insert(&self, consumer: TypeKey, implementation: TypeKey) -> Option<TypeKey> {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(consumer.id(), (consumer, implementation))
            .map(|(_, previous)| previous)
    }

    pub fn get(&self, consumer: TypeId) -> Option<TypeKey> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&consumer)
            .map(|&(_, implementation)| implementation)
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.map.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// The outcome of resolving an interface.
#[derive(Debug)]
pub enum Resolution {
    /// A single implementation, or the consumer's override among several.
    Found(Instance),
    /// No registered type implements the interface.
    NotFound,
    /// Several registered types implement the interface. Carries their names, sorted.
    Ambiguous(Vec<&'static str>),
}

/// Finds the registered implementation of an interface for a consumer.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceResolver<'a> {
    registry: &'a Registry,
    overrides: &'a Overrides,
}

impl<'a> InterfaceResolver<'a> {
    pub const fn new(registry: &'a Registry, overrides: &'a Overrides) -> Self {
        Self {
            registry,
            overrides,
        }
    }

    /// Resolves `interface` for a field of `consumer`.
    ///
    /// Candidates are the writable registered types that declare the interface. With more
    /// than one, the consumer's override is used if it is a candidate.
    pub fn resolve(&self, interface: TypeKey, consumer: TypeKey) -> Resolution {
        let mut candidates = self.registry.implementors(interface.id());
        match candidates.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Found(candidates.remove(0)),
            _ => {
                let picked = self.overrides.get(consumer.id()).and_then(|implementation| {
                    candidates
                        .iter()
                        .position(|candidate| candidate.key() == implementation)
                });
                match picked {
                    Some(index) => Resolution::Found(candidates.swap_remove(index)),
                    None => Resolution::Ambiguous(
                        candidates.iter().map(|candidate| candidate.key().name()).collect(),
                    ),
                }
            }
        }
    }
}
