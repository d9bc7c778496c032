//! The process-wide catalog of components, used to discover interface implementations
//! that were never registered.
//!
//! Types join the catalog at link time with the [`catalog!`](crate::catalog!) macro:
//!
//! ```
//! use wired::{Component, Interfaces};
//!
//! trait Clock: Send + Sync {}
//!
//! #[derive(Default)]
//! struct SystemClock;
//!
//! impl Clock for SystemClock {}
//!
//! impl Component for SystemClock {
//!     fn interfaces() -> Interfaces<Self> {
//!         Interfaces::new().with::<dyn Clock>(|this| this)
//!     }
//!
//!     fn auto_create() -> Option<Self> {
//!         Some(Self)
//!     }
//! }
//!
//! wired::catalog!(SystemClock);
//!
//! let catalog = wired::Catalog::linked();
//! assert!(!catalog.implementors(std::any::TypeId::of::<dyn Clock>()).is_empty());
//! ```

use std::any::TypeId;

use wired_core::{Component, Instance, TypeKey, create_instance};

/// A cataloged component type.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    key: fn() -> TypeKey,
    create: fn() -> Option<Instance>,
    implements: fn(TypeId) -> bool,
}

fn implements<T>(interface: TypeId) -> bool
where
    T: Component,
{
    T::interfaces().implements(interface)
}

impl CatalogEntry {
    pub const fn of<T>() -> Self
    where
        T: Component,
    {
        Self {
            key: TypeKey::of::<T>,
            create: create_instance::<T>,
            implements: implements::<T>,
        }
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// Creates a zero-valued instance, if the type supports auto-creation.
    #[inline]
    pub fn create(&self) -> Option<Instance> {
        (self.create)()
    }

    #[inline]
    pub fn implements(&self, interface: TypeId) -> bool {
        (self.implements)(interface)
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CatalogEntry").field(&self.key().name()).finish()
    }
}

/// Entries contributed by [`catalog!`](crate::catalog!) across every linked crate.
#[linkme::distributed_slice]
pub static CATALOG: [CatalogEntry];

/// A list of component types a container may auto-create to satisfy an interface.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a catalog of every type contributed with [`catalog!`](crate::catalog!).
    pub fn linked() -> Self {
        let mut catalog = Self::new();
        for entry in CATALOG.iter() {
            catalog.push(*entry);
        }
        catalog
    }

    #[must_use]
    pub fn with<T>(mut self) -> Self
    where
        T: Component,
    {
        self.add::<T>();
        self
    }

    pub fn add<T>(&mut self)
    where
        T: Component,
    {
        self.push(CatalogEntry::of::<T>());
    }

    fn push(&mut self, entry: CatalogEntry) {
        let key = entry.key();
        if !self.entries.iter().any(|existing| existing.key() == key) {
            self.entries.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries declaring the interface, ordered by type name.
    pub fn implementors(&self, interface: TypeId) -> Vec<CatalogEntry> {
        let mut found: Vec<CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.implements(interface))
            .copied()
            .collect();
        found.sort_by_key(|entry| entry.key().name());
        found
    }
}

/// Adds component types to the process-wide [`Catalog`].
///
/// ```
/// # use wired::Component;
/// #[derive(Default)]
/// struct Metrics;
///
/// impl Component for Metrics {}
///
/// wired::catalog!(Metrics);
/// ```
#[macro_export]
macro_rules! catalog {
    ($($ty:ty),+ $(,)?) => {
        $(
            const _: () = {
                #[$crate::__private::linkme::distributed_slice($crate::catalog::CATALOG)]
                #[linkme(crate = $crate::__private::linkme)]
                static ENTRY: $crate::catalog::CatalogEntry = $crate::catalog::CatalogEntry::of::<$ty>();
            };
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use wired_core::Interfaces;

    trait Transport: Send + Sync {}

    #[derive(Default)]
    struct Tcp;
    #[derive(Default)]
    struct Quic;
    struct Unlinked;

    impl Transport for Tcp {}
    impl Transport for Quic {}

    impl Component for Tcp {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Transport>(|this| this)
        }

        fn auto_create() -> Option<Self> {
            Some(Self)
        }
    }

    impl Component for Quic {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Transport>(|this| this)
        }

        fn auto_create() -> Option<Self> {
            Some(Self)
        }
    }

    impl Component for Unlinked {}

    crate::catalog!(Tcp, Quic);

    #[test]
    fn test_linked_entries() {
        let catalog = Catalog::linked();
        let found = catalog.implementors(TypeId::of::<dyn Transport>());
        let names: Vec<_> = found.iter().map(|entry| entry.key().name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Quic"));
        assert!(names[1].ends_with("Tcp"));
        assert!(found[0].create().is_some());
    }

    #[test]
    fn test_explicit_catalog() {
        let catalog = Catalog::new().with::<Tcp>().with::<Tcp>().with::<Unlinked>();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.implementors(TypeId::of::<dyn Transport>()).len(), 1);

        let unlinked = Catalog::new().with::<Unlinked>();
        let entry = unlinked.entries[0];
        assert!(entry.create().is_none());
        assert!(!entry.implements(TypeId::of::<dyn Transport>()));
    }
}
