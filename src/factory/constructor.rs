use std::sync::Arc;

use wired_core::TypeKey;

use crate::registry::Registry;

/// Parameters that can be resolved from a [`Registry`].
///
/// Implemented for `Arc<T>`, for `()` and for tuples of up to twelve resolvable types.
pub trait Resolve: Sized {
    /// Returns the types the parameters are looked up by, in order.
    fn keys() -> Vec<TypeKey>;

    /// Resolves the parameters, returning `None` if any of them is not bound.
    fn resolve(registry: &Registry) -> Option<Self>;
}

impl<T> Resolve for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn keys() -> Vec<TypeKey> {
        vec![TypeKey::of::<T>()]
    }

    fn resolve(registry: &Registry) -> Option<Self> {
        registry.get_typed::<T>()
    }
}

impl Resolve for () {
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    fn resolve(_registry: &Registry) -> Option<Self> {
        Some(())
    }
}

macro_rules! impl_resolve_tuple {
    ($($ty:ident),*) => {
        impl<$($ty,)*> Resolve for ($($ty,)*)
        where
            $($ty: Resolve,)*
        {
            fn keys() -> Vec<TypeKey> {
                let mut keys = Vec::new();
                $( keys.extend($ty::keys()); )*
                keys
            }

            fn resolve(registry: &Registry) -> Option<Self> {
                Some(( $( $ty::resolve(registry)?, )* ))
            }
        }
    };
}

apply_tuples!(impl_resolve_tuple);

/// Constructs a value from resolved parameters.
///
/// Implemented for every `FnOnce` taking up to twelve parameters; `T` is the tuple of
/// parameter types.
pub trait Constructor<T> {
    /// The type of the constructed value.
    type Constructed;

    /// Calls the constructor.
    fn construct(self, param: T) -> Self::Constructed;
}

impl<F, O> Constructor<()> for F
where
    F: FnOnce() -> O,
{
    type Constructed = O;

    fn construct(self, _param: ()) -> Self::Constructed {
        self()
    }
}

macro_rules! impl_constructor_tuple {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, O, $($ty,)*> Constructor<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> O,
        {
            type Constructed = O;

            fn construct(self, param: ($($ty,)*)) -> Self::Constructed {
                let ($($ty,)*) = param;
                self($($ty,)*)
            }
        }
    };
}

apply_tuples!(impl_constructor_tuple);
