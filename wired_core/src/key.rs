//! Binding keys.

use std::any::{TypeId, type_name};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Identity of a type, carrying its name for diagnostics.
///
/// Equality, ordering and hashing only consider the [`TypeId`].
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the type.
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the name of the type, as given by [`type_name`].
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// The key a binding is stored under: its concrete type or a logical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Type(TypeKey),
    Name(String),
}

impl Key {
    /// Returns the type key of `T`.
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self::Type(TypeKey::of::<T>())
    }

    /// Returns a name key.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl From<TypeKey> for Key {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type(key) => write!(f, "type `{key}`"),
            Self::Name(name) => write!(f, "name `{name}`"),
        }
    }
}
