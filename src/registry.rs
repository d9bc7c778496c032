//! Storage of resolved bindings.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use wired_core::{Error, Instance, Key, Result};

/// A resolved binding.
#[derive(Debug, Clone)]
struct Binding {
    instance: Instance,
    // Read-only bindings can be looked up, but are never walked nor offered as interface
    // candidates.
    read_only: bool,
}

/// Resolved instances, keyed by their concrete type and by logical name.
///
/// Each map sits behind its own reader/writer lock: lookups proceed concurrently, insertions
/// are exclusive. A type binding and a name binding may refer to the same instance.
#[derive(Debug)]
pub struct Registry {
    types: RwLock<BTreeMap<TypeId, Binding>>,
    names: RwLock<BTreeMap<String, Binding>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    /// Creates an empty `Registry`.
    pub const fn new() -> Self {
        Self {
            types: RwLock::new(BTreeMap::new()),
            names: RwLock::new(BTreeMap::new()),
        }
    }

    /// Binds an instance under its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if the type is already bound.
    pub fn insert(&self, instance: Instance, read_only: bool) -> Result<()> {
        let mut types = write(&self.types);
        let key = instance.key();
        if types.contains_key(&key.id()) {
            return Err(Error::DuplicateRegistration(Key::Type(key)));
        }
        types.insert(key.id(), Binding { instance, read_only });
        Ok(())
    }

    /// Binds an instance under its concrete type, unless another thread bound the type first.
    ///
    /// Returns the instance that ends up bound.
    pub fn insert_or_existing(&self, instance: Instance) -> Instance {
        {
            let types = read(&self.types);
            if let Some(binding) = types.get(&instance.key().id()) {
                return binding.instance.clone();
            }
        }

        let mut types = write(&self.types);
        // Some other thread might insert between the time read lock is released and the
        // write lock is acquired. If that's the case, keep the existing binding.
        types
            .entry(instance.key().id())
            .or_insert(Binding {
                instance,
                read_only: false,
            })
            .instance
            .clone()
    }

    /// Binds an instance under a logical name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegistrant`] if the name is empty, and
    /// [`Error::DuplicateRegistration`] if the name is already bound.
    pub fn insert_named(&self, name: &str, instance: Instance, read_only: bool) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidRegistrant(format!(
                "`{}` is bound to an empty name",
                instance.key()
            )));
        }

        let mut names = write(&self.names);
        if names.contains_key(name) {
            return Err(Error::DuplicateRegistration(Key::name(name)));
        }
        names.insert(name.to_string(), Binding { instance, read_only });
        Ok(())
    }

    /// Returns the instance bound to a type.
    pub fn get(&self, type_id: TypeId) -> Option<Instance> {
        read(&self.types)
            .get(&type_id)
            .map(|binding| binding.instance.clone())
    }

    /// Returns the instance bound to a name.
    pub fn get_by_name(&self, name: &str) -> Option<Instance> {
        read(&self.names)
            .get(name)
            .map(|binding| binding.instance.clone())
    }

    /// Returns the shared pointer bound to `T`, which may be an interface bound by a
    /// factory.
    pub fn get_typed<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get(TypeId::of::<T>())?.downcast()
    }

    /// Returns the shared pointer bound to a name, if it is a `T`.
    pub fn get_typed_by_name<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_by_name(name)?.downcast()
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        read(&self.types).contains_key(&type_id)
    }

    #[inline]
    pub fn contains_name(&self, name: &str) -> bool {
        read(&self.names).contains_key(name)
    }

    /// Returns the number of type bindings.
    pub fn len(&self) -> usize {
        read(&self.types).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && read(&self.names).is_empty()
    }

    /// Returns the instances to walk during initialization: every writable binding, each
    /// instance once, ordered by type name then by binding name.
    pub fn roots(&self) -> Vec<Instance> {
        let mut roots: Vec<Instance> = read(&self.types)
            .values()
            .filter(|binding| !binding.read_only)
            .map(|binding| binding.instance.clone())
            .collect();
        roots.sort_by_key(|instance| instance.key().name());

        for binding in read(&self.names).values() {
            if !binding.read_only && !roots.iter().any(|root| root.same_as(&binding.instance)) {
                roots.push(binding.instance.clone());
            }
        }
        roots
    }

    /// Returns the writable type bindings whose component declares the interface, ordered by
    /// type name.
    pub fn implementors(&self, interface: TypeId) -> Vec<Instance> {
        let mut found: Vec<Instance> = read(&self.types)
            .values()
            .filter(|binding| !binding.read_only && binding.instance.implements(interface))
            .map(|binding| binding.instance.clone())
            .collect();
        found.sort_by_key(|instance| instance.key().name());
        found
    }

    /// Removes every binding.
    pub fn clear(&self) {
        write(&self.types).clear();
        write(&self.names).clear();
    }
}
