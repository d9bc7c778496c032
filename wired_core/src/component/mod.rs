//! Components: values that can be bound, injected into, and cast to interfaces.

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::erased::Erased;
use crate::key::TypeKey;

mod dep;
mod field;
mod instance;

pub use dep::{Dep, Slot};
pub use field::{Field, FieldKind};
pub use instance::{Instance, create_instance};

/// A value that can be bound in a container.
///
/// All methods have defaults, so a type without dependencies, interfaces or
/// a zero value only needs an empty `impl`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use wired_core::{Component, Dep, Field, Interfaces};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct Database;
///
/// impl Component for Database {
///     fn auto_create() -> Option<Self> {
///         Some(Self::default())
///     }
/// }
///
/// #[derive(Default)]
/// struct Service {
///     db: Dep<Database>,
///     greeting: Dep<String>,
/// }
///
/// impl Greeter for Service {
///     fn greet(&self) -> String {
///         format!("{}!", self.greeting.get().map_or("hi", |s| s.as_str()))
///     }
/// }
///
/// impl Component for Service {
///     fn fields(&self) -> Vec<Field<'_>> {
///         vec![
///             Field::new("db", &self.db),
///             Field::new("greeting", &self.greeting).named("greeting"),
///         ]
///     }
///
///     fn interfaces() -> Interfaces<Self> {
///         Interfaces::new().with::<dyn Greeter>(|this| this)
///     }
/// }
///
/// let service = Service::default();
/// assert_eq!(service.fields().len(), 2);
/// assert!(Service::interfaces().implements(std::any::TypeId::of::<dyn Greeter>()));
/// assert_eq!(service.greet(), "hi!");
/// # let _ = Arc::new(service);
/// ```
pub trait Component: Send + Sync + 'static {
    /// Returns the injectable fields of this value, in declaration order.
    ///
    /// The position of a field in the returned list is its index in the dependency graph.
    fn fields(&self) -> Vec<Field<'_>> {
        Vec::new()
    }

    /// Returns the interfaces values of this type can be used as.
    fn interfaces() -> Interfaces<Self>
    where
        Self: Sized,
    {
        Interfaces::new()
    }

    /// Creates a zero-valued instance when a container auto-creates a missing dependency.
    ///
    /// Returns `None` for types that must be registered explicitly.
    fn auto_create() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

macro_rules! impl_component {
    ($($ty:ty),* $(,)?) => {
        $( impl Component for $ty {} )*
    };
}

impl_component!(
    String, bool, char, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

/// Converts a type-erased `Arc<T>` into a type-erased `Arc<I>`.
#[derive(Clone)]
pub struct Cast {
    interface: TypeKey,
    cast: Arc<dyn Fn(&Erased) -> Option<Erased> + Send + Sync>,
}

impl Cast {
    /// Creates a cast from `T` into the interface `I`.
    pub fn new<T, I>(cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Component,
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            interface: TypeKey::of::<I>(),
            cast: Arc::new(move |value: &Erased| {
                value.to_arc::<T>().map(|v| Erased::from_arc(cast(v)))
            }),
        }
    }

    /// Creates the cast of an `Arc<I>` into itself.
    pub fn identity<I>() -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            interface: TypeKey::of::<I>(),
            cast: Arc::new(|value: &Erased| value.to_arc::<I>().map(Erased::from_arc)),
        }
    }

    /// Returns the key of the target interface.
    #[inline]
    pub const fn interface(&self) -> TypeKey {
        self.interface
    }

    /// Applies the cast to a value holding an `Arc<T>`.
    pub fn apply(&self, value: &Erased) -> Option<Erased> {
        (self.cast)(value)
    }
}

impl std::fmt::Debug for Cast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cast")
            .field("interface", &self.interface.name())
            .finish_non_exhaustive()
    }
}

/// The interfaces a component type declares, each with its cast.
pub struct Interfaces<T> {
    casts: Vec<Cast>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Interfaces<T> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            casts: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the list contains the interface.
    pub fn implements(&self, interface: TypeId) -> bool {
        self.casts.iter().any(|cast| cast.interface.id() == interface)
    }

    /// Returns the declared casts.
    pub fn into_casts(self) -> Vec<Cast> {
        self.casts
    }
}

impl<T: Component> Interfaces<T> {
    /// Declares that `T` can be used as `I`.
    ///
    /// The cast is usually the identity closure `|this| this`, which relies on the
    /// unsized coercion from `Arc<T>` into `Arc<I>`.
    #[must_use]
    pub fn with<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.casts.push(Cast::new(cast));
        self
    }
}

impl<T> Default for Interfaces<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Interfaces<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.casts).finish()
    }
}
