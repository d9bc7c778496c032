//! Factories: deferred bindings produced by constructor functions.

use std::error::Error as StdError;
use std::sync::Arc;

use wired_core::{Component, Error, Instance, Result, TypeKey};

use crate::registry::Registry;

mod constructor;
pub use constructor::{Constructor, Resolve};

/// The value returned by a factory.
///
/// Implemented for the accepted factory return shapes:
///
/// - `Arc<T>`: a value.
/// - `Result<Arc<T>, E>`: a value or an error, which fails initialization.
/// - `(Arc<T>, &'static str)` and `(Arc<T>, String)`: a value and the name to bind it under.
/// - [`Provided<I>`], `Result<Provided<I>, E>` and `(Provided<I>, &'static str)`: the same
///   shapes for a value only known as the interface `I`.
pub trait FactoryOutput: Send + 'static {
    /// The type the output is bound under.
    type Output: ?Sized + Send + Sync + 'static;

    /// Whether the output carries a name.
    const NAMED: bool;

    /// Converts the output into an instance and an optional name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Factory`] if the factory reported an error.
    fn into_produced(self) -> Result<Produced>;
}

/// A factory output ready to be bound.
#[derive(Debug)]
pub struct Produced {
    pub(crate) instance: Instance,
    pub(crate) name: Option<String>,
}

impl Produced {
    fn unnamed(instance: Instance) -> Self {
        Self {
            instance,
            name: None,
        }
    }

    fn named(instance: Instance, name: impl Into<String>) -> Self {
        Self {
            instance,
            name: Some(name.into()),
        }
    }
}

/// An interface value returned by a factory.
///
/// The value is bound under `I` itself. Interface fields of type `I` count it as a
/// candidate, next to every registered component declaring `I`, and factories can take it
/// as an `Arc<I>` input.
///
/// ```
/// use std::sync::Arc;
///
/// use wired::factory::Provided;
/// use wired::Container;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct Fixed(u64);
///
/// impl Clock for Fixed {
///     fn now(&self) -> u64 {
///         self.0
///     }
/// }
///
/// # fn main() -> wired::Result<()> {
/// let container = Container::new();
/// container.register_factory(|| Provided(Arc::new(Fixed(7)) as Arc<dyn Clock>))?;
/// assert_eq!(container.get::<dyn Clock>()?.now(), 7);
/// # Ok(())
/// # }
/// ```
pub struct Provided<I: ?Sized>(pub Arc<I>);

impl<I: ?Sized> From<Arc<I>> for Provided<I> {
    fn from(value: Arc<I>) -> Self {
        Self(value)
    }
}

impl<I: ?Sized> std::fmt::Debug for Provided<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Provided")
            .field(&std::any::type_name::<I>())
            .finish()
    }
}

impl<T> FactoryOutput for Arc<T>
where
    T: Component,
{
    type Output = T;

    const NAMED: bool = false;

    fn into_produced(self) -> Result<Produced> {
        Ok(Produced::unnamed(Instance::new(self)))
    }
}

impl<T, E> FactoryOutput for Result<Arc<T>, E>
where
    T: Component,
    E: Into<Box<dyn StdError + Send + Sync>> + Send + 'static,
{
    type Output = T;

    const NAMED: bool = false;

    fn into_produced(self) -> Result<Produced> {
        self.map_err(Error::factory::<T, E>)?.into_produced()
    }
}

impl<T> FactoryOutput for (Arc<T>, &'static str)
where
    T: Component,
{
    type Output = T;

    const NAMED: bool = true;

    fn into_produced(self) -> Result<Produced> {
        let (value, name) = self;
        Ok(Produced::named(Instance::new(value), name))
    }
}

impl<T> FactoryOutput for (Arc<T>, String)
where
    T: Component,
{
    type Output = T;

    const NAMED: bool = true;

    fn into_produced(self) -> Result<Produced> {
        let (value, name) = self;
        Ok(Produced::named(Instance::new(value), name))
    }
}

impl<I> FactoryOutput for Provided<I>
where
    I: ?Sized + Send + Sync + 'static,
{
    type Output = I;

    const NAMED: bool = false;

    fn into_produced(self) -> Result<Produced> {
        Ok(Produced::unnamed(Instance::provided(self.0)))
    }
}

impl<I, E> FactoryOutput for Result<Provided<I>, E>
where
    I: ?Sized + Send + Sync + 'static,
    E: Into<Box<dyn StdError + Send + Sync>> + Send + 'static,
{
    type Output = I;

    const NAMED: bool = false;

    fn into_produced(self) -> Result<Produced> {
        self.map_err(Error::factory::<I, E>)?.into_produced()
    }
}

impl<I> FactoryOutput for (Provided<I>, &'static str)
where
    I: ?Sized + Send + Sync + 'static,
{
    type Output = I;

    const NAMED: bool = true;

    fn into_produced(self) -> Result<Produced> {
        let (Provided(value), name) = self;
        Ok(Produced::named(Instance::provided(value), name))
    }
}

type Invoke = Box<dyn FnOnce(&Registry) -> Option<Result<Produced>> + Send>;

/// A factory waiting for its inputs to be bound.
pub(crate) struct PendingFactory {
    output: TypeKey,
    named: bool,
    inputs: Vec<TypeKey>,
    read_only: bool,
    invoke: Invoke,
}

impl PendingFactory {
    pub(crate) fn new<C, T>(constructor: C, read_only: bool) -> Self
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        let invoke = move |registry: &Registry| {
            let param = T::resolve(registry)?;
            Some(constructor.construct(param).into_produced())
        };

        Self {
            output: TypeKey::of::<<C::Constructed as FactoryOutput>::Output>(),
            named: <C::Constructed as FactoryOutput>::NAMED,
            inputs: T::keys(),
            read_only,
            invoke: Box::new(invoke),
        }
    }

    #[inline]
    pub(crate) const fn output(&self) -> TypeKey {
        self.output
    }

    #[inline]
    pub(crate) const fn is_named(&self) -> bool {
        self.named
    }

    #[inline]
    pub(crate) fn inputs(&self) -> &[TypeKey] {
        &self.inputs
    }

    /// Returns `true` if every input is bound in the registry.
    pub(crate) fn is_ready(&self, registry: &Registry) -> bool {
        self.inputs.iter().all(|input| registry.contains(input.id()))
    }

    /// Checks that the factory can ever be invoked.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.inputs.contains(&self.output) {
            return Err(Error::InvalidFactorySignature(
                self.output.name(),
                "the factory requires its own output as an input".to_string(),
            ));
        }
        Ok(())
    }

    /// Invokes the factory and binds its output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDependency`] if an input disappeared since
    /// [`is_ready`](Self::is_ready) was checked, or any error from the factory or from
    /// binding its output.
    pub(crate) fn run(self, registry: &Registry) -> Result<Produced> {
        let Self {
            output,
            inputs,
            invoke,
            read_only,
            ..
        } = self;

        let Some(produced) = invoke(registry) else {
            let missing = inputs
                .iter()
                .find(|input| !registry.contains(input.id()))
                .map_or(output.name(), TypeKey::name);
            return Err(Error::UnresolvedDependency {
                ty: missing,
                required_by: format!("factory for `{}`", output.name()),
            });
        };
        let produced = produced?;
        bind(registry, &produced, read_only)?;
        Ok(produced)
    }
}

impl std::fmt::Debug for PendingFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFactory")
            .field("output", &self.output.name())
            .field("named", &self.named)
            .field(
                "inputs",
                &self.inputs.iter().map(TypeKey::name).collect::<Vec<_>>(),
            )
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// Binds a factory output under its name if it has one, and under its type otherwise.
///
/// # Errors
///
/// Returns [`Error::DuplicateRegistration`] if the name or the type is already bound.
pub(crate) fn bind(registry: &Registry, produced: &Produced, read_only: bool) -> Result<()> {
    let instance = produced.instance.clone();
    match &produced.name {
        Some(name) => registry.insert_named(name, instance, read_only),
        None => registry.insert(instance, read_only),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Down;

    impl fmt::Display for Down {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("database is down")
        }
    }

    impl StdError for Down {}

    struct Database;
    struct Repository(#[allow(dead_code)] Arc<Database>);

    impl Component for Database {}
    impl Component for Repository {}

    #[test]
    fn test_zero_input_factory() {
        let registry = Registry::new();
        let factory = PendingFactory::new(|| Arc::new(Database), false);
        assert!(factory.inputs().is_empty());
        assert!(factory.is_ready(&registry));

        let produced = factory.run(&registry).unwrap();
        assert!(produced.name.is_none());
        assert!(registry.get_typed::<Database>().is_some());
    }

    #[test]
    fn test_factory_waits_for_inputs() {
        let registry = Registry::new();
        let factory = PendingFactory::new(|db: Arc<Database>| Arc::new(Repository(db)), false);
        assert_eq!(factory.output(), TypeKey::of::<Repository>());
        assert_eq!(factory.inputs(), &[TypeKey::of::<Database>()]);
        assert!(!factory.is_ready(&registry));

        let err = factory.run(&registry).unwrap_err();
        assert!(err.is_unresolved_dependency());
    }

    #[test]
    fn test_named_output_binds_name_only() {
        let registry = Registry::new();
        let factory = PendingFactory::new(|| (Arc::new("hello".to_string()), "greeting"), false);
        assert!(factory.is_named());
        factory.run(&registry).unwrap();

        assert_eq!(*registry.get_typed_by_name::<String>("greeting").unwrap(), "hello");
        assert!(registry.get_typed::<String>().is_none());

        let second = PendingFactory::new(|| (Arc::new("bye".to_string()), "farewell".to_string()), false);
        second.run(&registry).unwrap();
        assert_eq!(*registry.get_typed_by_name::<String>("farewell").unwrap(), "bye");

        let reused = PendingFactory::new(|| (Arc::new("again".to_string()), "greeting"), false);
        assert!(reused.run(&registry).unwrap_err().is_duplicate_registration());
    }

    trait Store: Send + Sync {
        fn rows(&self) -> u32;
    }

    impl Store for Database {
        fn rows(&self) -> u32 {
            3
        }
    }

    #[test]
    fn test_interface_output() {
        let registry = Registry::new();
        let factory = PendingFactory::new(|| Provided(Arc::new(Database) as Arc<dyn Store>), false);
        assert_eq!(factory.output(), TypeKey::of::<dyn Store>());
        assert!(!factory.is_named());
        factory.run(&registry).unwrap();

        assert_eq!(registry.get_typed::<dyn Store>().unwrap().rows(), 3);
        assert!(registry.get_typed::<Database>().is_none());
        assert_eq!(registry.implementors(std::any::TypeId::of::<dyn Store>()).len(), 1);

        let consumer = PendingFactory::new(|store: Arc<dyn Store>| Arc::new(store.rows()), false);
        assert_eq!(consumer.inputs(), &[TypeKey::of::<dyn Store>()]);
        assert!(consumer.is_ready(&registry));
        consumer.run(&registry).unwrap();
        assert_eq!(*registry.get_typed::<u32>().unwrap(), 3);

        let failing = PendingFactory::new(|| -> Result<Provided<dyn Store>, Down> { Err(Down) }, false);
        let err = failing.run(&registry).unwrap_err();
        assert!(err.is_factory());
        assert!(err.to_string().contains("dyn"));
    }

    #[test]
    fn test_error_output() {
        let registry = Registry::new();
        let factory = PendingFactory::new(|| -> Result<Arc<Database>, Down> { Err(Down) }, false);
        let err = factory.run(&registry).unwrap_err();
        assert!(err.is_factory());
        assert!(err.to_string().contains("database is down"));
        assert!(!registry.contains(std::any::TypeId::of::<Database>()));
    }

    #[test]
    fn test_self_dependency_is_invalid() {
        let factory = PendingFactory::new(|db: Arc<Database>| db, false);
        let err = factory.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySignature(_, _)));
    }
}
