use std::any::type_name;
use std::sync::{Arc, OnceLock};

use crate::erased::Erased;

/// An injectable field holding a shared dependency.
///
/// A `Dep` starts empty and is set at most once, either by a container while it walks
/// the fields of the owning component, or up front with [`From<Arc<T>>`] when the
/// dependency is passed through a constructor. Setting works through a shared
/// reference, so components already owned by a container can still be completed.
///
/// `T` is either a concrete component or an interface trait object, e.g.
/// `Dep<dyn Greeter>`.
pub struct Dep<T: ?Sized> {
    cell: OnceLock<Arc<T>>,
}

impl<T: ?Sized> Dep<T> {
    /// Creates an empty field.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the injected dependency, if any.
    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    /// Returns a clone of the injected pointer, if any.
    #[inline]
    pub fn cloned(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Returns `true` if a dependency has been injected.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Sets the dependency.
    ///
    /// # Errors
    ///
    /// Returns `value` back if the field is already set.
    pub fn set(&self, value: Arc<T>) -> Result<(), Arc<T>> {
        self.cell.set(value)
    }
}

impl<T: ?Sized> Default for Dep<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Dep<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: ?Sized> From<Arc<T>> for Dep<T> {
    fn from(value: Arc<T>) -> Self {
        Self {
            cell: OnceLock::from(value),
        }
    }
}

impl<T: ?Sized> std::ops::Deref for Dep<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the dependency has not been injected yet.
    fn deref(&self) -> &Self::Target {
        self.cell
            .get()
            .unwrap_or_else(|| panic!("dependency `{}` has not been injected", type_name::<T>()))
    }
}

impl<T: ?Sized> std::fmt::Debug for Dep<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("type", &type_name::<T>())
            .field("set", &self.is_set())
            .finish()
    }
}

/// A type-erased view of a [`Dep`], used by containers to fill fields.
pub trait Slot: Send + Sync {
    /// Returns `true` if the slot already holds a value.
    fn is_set(&self) -> bool;

    /// Stores `value` if it holds an `Arc` of the slot's type and the slot is empty.
    ///
    /// Returns `false` if the value has a different type or the slot is already set.
    fn set_erased(&self, value: &Erased) -> bool;
}

impl<T> Slot for Dep<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn is_set(&self) -> bool {
        Self::is_set(self)
    }

    fn set_erased(&self, value: &Erased) -> bool {
        value
            .to_arc::<T>()
            .is_some_and(|value| self.cell.set(value).is_ok())
    }
}
