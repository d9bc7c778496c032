use crate::component::dep::{Dep, Slot};
use crate::component::instance::{Instance, create_instance};
use crate::component::Component;
use crate::key::TypeKey;

/// How the dependency of a field is looked up.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A concrete component, looked up by its type. `create` makes a zero-valued
    /// instance for auto-creation.
    Concrete { create: fn() -> Option<Instance> },
    /// An interface trait object, satisfied by any component declaring it.
    Interface,
}

/// Describes one injectable field of a [`Component`].
///
/// Fields are built with [`Field::new`] for concrete dependencies and
/// [`Field::interface`] for trait objects, then refined with [`named`](Self::named),
/// [`private`](Self::private) and [`optional`](Self::optional).
pub struct Field<'a> {
    name: &'static str,
    ty: TypeKey,
    kind: FieldKind,
    binding: Option<&'static str>,
    private: bool,
    optional: bool,
    slot: &'a dyn Slot,
}

impl<'a> Field<'a> {
    /// Describes a field holding a concrete component.
    pub fn new<T>(name: &'static str, slot: &'a Dep<T>) -> Self
    where
        T: Component,
    {
        Self::with_kind(
            name,
            TypeKey::of::<T>(),
            FieldKind::Concrete {
                create: create_instance::<T>,
            },
            slot,
        )
    }

    /// Describes a field holding an interface trait object.
    pub fn interface<I>(name: &'static str, slot: &'a Dep<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self::with_kind(name, TypeKey::of::<I>(), FieldKind::Interface, slot)
    }

    fn with_kind(name: &'static str, ty: TypeKey, kind: FieldKind, slot: &'a dyn Slot) -> Self {
        Self {
            name,
            ty,
            kind,
            binding: None,
            private: false,
            optional: false,
            slot,
        }
    }

    /// Binds the field to a logical name instead of its type.
    #[must_use]
    pub const fn named(mut self, binding: &'static str) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Marks the field as private. Containers configured to ignore private fields skip it.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Marks the field as optional. An unresolved optional field is left empty.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared type of the field.
    #[inline]
    pub const fn ty(&self) -> TypeKey {
        self.ty
    }

    #[inline]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the logical name the field is bound to, if any.
    #[inline]
    pub const fn binding(&self) -> Option<&'static str> {
        self.binding
    }

    #[inline]
    pub const fn is_private(&self) -> bool {
        self.private
    }

    #[inline]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub const fn is_interface(&self) -> bool {
        matches!(self.kind, FieldKind::Interface)
    }

    /// Returns the slot the dependency is stored into.
    #[inline]
    pub fn slot(&self) -> &'a dyn Slot {
        self.slot
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("ty", &self.ty.name())
            .field("binding", &self.binding)
            .field("private", &self.private)
            .field("optional", &self.optional)
            .field("set", &self.slot.is_set())
            .finish_non_exhaustive()
    }
}
