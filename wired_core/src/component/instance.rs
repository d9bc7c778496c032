use std::any::TypeId;
use std::sync::Arc;

use crate::component::{Cast, Component, Field, FieldKind};
use crate::erased::Erased;
use crate::key::TypeKey;

/// A type-erased component as stored in a registry.
///
/// An instance keeps the shared pointer to the component twice: as an [`Erased`] `Arc<T>`
/// for typed lookups, and as an `Arc<dyn Component>` for walking its fields. Both point to
/// the same allocation.
#[derive(Clone)]
pub struct Instance {
    key: TypeKey,
    value: Erased,
    component: Arc<dyn Component>,
    casts: Arc<[Cast]>,
}

impl Instance {
    /// Wraps a shared component.
    pub fn new<T>(value: Arc<T>) -> Self
    where
        T: Component,
    {
        Self {
            key: TypeKey::of::<T>(),
            value: Erased::from_arc(Arc::clone(&value)),
            component: value,
            casts: T::interfaces().into_casts().into(),
        }
    }

    /// Wraps a value that is only known as the interface `I`, e.g. a factory output.
    ///
    /// The instance is keyed by `I`, declares `I` only, and has no fields to walk.
    pub fn provided<I>(value: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<I>(),
            value: Erased::from_arc(value),
            component: Arc::new(Opaque),
            casts: Arc::new([Cast::identity::<I>()]),
        }
    }

    /// Returns the concrete type of the component, or the interface of a
    /// [provided](Self::provided) value.
    #[inline]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the erased `Arc<T>`.
    #[inline]
    pub const fn value(&self) -> &Erased {
        &self.value
    }

    #[inline]
    pub fn component(&self) -> &dyn Component {
        &*self.component
    }

    /// Returns the shared pointer if the component is a `T`.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.value.to_arc::<T>()
    }

    /// Returns `true` if the component type declares the interface.
    pub fn implements(&self, interface: TypeId) -> bool {
        self.casts.iter().any(|cast| cast.interface().id() == interface)
    }

    /// Casts the component into the interface, returning an erased `Arc<I>`.
    pub fn cast(&self, interface: TypeId) -> Option<Erased> {
        self.casts
            .iter()
            .find(|cast| cast.interface().id() == interface)
            .and_then(|cast| cast.apply(&self.value))
    }

    /// Returns the value to store into `field`, if this instance fits its declared type.
    pub fn erased_for(&self, field: &Field<'_>) -> Option<Erased> {
        match field.kind() {
            FieldKind::Concrete { .. } => (self.key == field.ty()).then(|| self.value.clone()),
            FieldKind::Interface => self.cast(field.ty().id()),
        }
    }

    /// Returns `true` if both instances share the same allocation.
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.component), Arc::as_ptr(&other.component))
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.key.name())
            .field("interfaces", &self.casts)
            .finish_non_exhaustive()
    }
}

// Stands in for the component of a provided value.
struct Opaque;

impl Component for Opaque {}

/// Creates an instance of `T` from its zero value, if it has one.
pub fn create_instance<T>() -> Option<Instance>
where
    T: Component,
{
    T::auto_create().map(|value| Instance::new(Arc::new(value)))
}
