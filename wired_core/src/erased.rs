//! Utilites around opaque values with erased type informations.

use std::any::Any;
use std::sync::Arc;

/// [`CloneBoxed`] is a trait to clone a reference to an `?Sized` type into a [`Box`].
///
/// This trait is used to work around [`Sized`] bound on [`Clone`].
trait CloneBoxed: Any + Send + Sync {
    /// Returns the boxed clone of `self`.
    fn clone_boxed(&self) -> Box<dyn CloneBoxed>;
}

impl<T> CloneBoxed for T
where
    T: Any + Clone + Send + Sync,
{
    fn clone_boxed(&self) -> Box<dyn CloneBoxed> {
        Box::new(self.clone())
    }
}

/// [`Erased`] is a container for value of an arbitrary type, as long as it
/// implements [`Clone`], [`Send`], and [`Sync`] and is `'static`.
///
/// Bindings store shared pointers, so most erased values hold an [`Arc`]. See
/// [`from_arc`](Self::from_arc) and [`to_arc`](Self::to_arc).
pub struct Erased(Box<dyn CloneBoxed + Send + Sync>);

impl Erased {
    /// Creates a new `Erased` with the provided `value` of type `T`.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self(Box::new(value) as Box<dyn CloneBoxed + Send + Sync>)
    }

    /// Creates a new `Erased` holding a shared pointer.
    ///
    /// `T` may be unsized, e.g. an interface trait object.
    #[must_use]
    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::new(value)
    }

    /// Returns a clone of the shared pointer if `self` holds an `Arc<T>`.
    ///
    /// The returned pointer refers to the same allocation as the stored one.
    pub fn to_arc<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.downcast_ref::<Arc<T>>().cloned()
    }
}

impl std::ops::Deref for Erased {
    type Target = dyn Any + Send + Sync;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Clone for Erased {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl std::fmt::Debug for Erased {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erased").finish_non_exhaustive()
    }
}
