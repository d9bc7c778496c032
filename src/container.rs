use std::any::type_name;
use std::sync::{Arc, PoisonError, RwLock};

use wired_core::{Component, Error, Instance, Key, Result, TypeKey};

use crate::catalog::Catalog;
use crate::factory::{Constructor, FactoryOutput, PendingFactory, Resolve};
use crate::graph::{Edge, Graph};
use crate::injector::Injector;
use crate::options::{Options, Strictness};
use crate::registry::Registry;
use crate::resolver::{InterfaceResolver, Overrides};
use crate::scheduler::Scheduler;

/// A dependency injection container.
///
/// Instances and factories are registered first, then [`init`](Self::init) invokes the
/// factories and fills the [`Dep`](wired_core::Dep) fields of every registered component.
/// Lookups and ad-hoc injection are safe to call from many threads once initialized.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use wired::{Component, Container, Dep, Field};
///
/// struct Config {
///     url: &'static str,
/// }
///
/// impl Component for Config {}
///
/// struct Database {
///     config: Arc<Config>,
/// }
///
/// impl Component for Database {}
///
/// #[derive(Default)]
/// struct Handler {
///     db: Dep<Database>,
/// }
///
/// impl Component for Handler {
///     fn fields(&self) -> Vec<Field<'_>> {
///         vec![Field::new("db", &self.db)]
///     }
/// }
///
/// # fn main() -> wired::Result<()> {
/// let container = Container::new();
/// container.register_factory(|config: Arc<Config>| Arc::new(Database { config }))?;
/// container.register_instance(Arc::new(Config { url: "postgres://localhost" }))?;
/// container.register_instance(Arc::new(Handler::default()))?;
/// container.init()?;
///
/// let handler = container.get::<Handler>()?;
/// assert_eq!(handler.db.config.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Container {
    registry: Registry,
    scheduler: Scheduler,
    overrides: Overrides,
    graph: Graph,
    catalog: Catalog,
    options: RwLock<Options>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates a container with default [`Options`] and the [linked](Catalog::linked)
    /// catalog.
    pub fn new() -> Self {
        Self::from_parts(Options::new(), Catalog::linked())
    }

    pub fn with_options(options: Options) -> Self {
        Self::from_parts(options, Catalog::linked())
    }

    /// Creates a container that only auto-discovers interface implementations in `catalog`.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self::from_parts(Options::new(), catalog)
    }

    /// Returns a new builder for `Container`.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    const fn from_parts(options: Options, catalog: Catalog) -> Self {
        Self {
            registry: Registry::new(),
            scheduler: Scheduler::new(),
            overrides: Overrides::new(),
            graph: Graph::new(),
            catalog,
            options: RwLock::new(options),
        }
    }

    /// Returns the current options.
    pub fn options(&self) -> Options {
        *self.options.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_options(&self, update: impl FnOnce(&mut Options)) {
        update(&mut self.options.write().unwrap_or_else(PoisonError::into_inner));
    }

    pub fn set_auto_create(&self, auto_create: bool) {
        self.update_options(|options| options.auto_create = auto_create);
    }

    pub fn set_debug_logging(&self, debug_logging: bool) {
        self.update_options(|options| options.debug_logging = debug_logging);
    }

    pub fn set_ignore_private_fields(&self, ignore_private_fields: bool) {
        self.update_options(|options| options.ignore_private_fields = ignore_private_fields);
    }

    /// Registers a component instance under its type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if `T` is already bound or will be bound by
    /// a pending factory.
    pub fn register_instance<T>(&self, value: Arc<T>) -> Result<()>
    where
        T: Component,
    {
        self.add_instance(Instance::new(value), false)
    }

    /// Registers an instance that can be looked up and injected, but is never walked nor
    /// offered as an interface implementation.
    ///
    /// # Errors
    ///
    /// Same as [`register_instance`](Self::register_instance).
    pub fn register_read_only_instance<T>(&self, value: Arc<T>) -> Result<()>
    where
        T: Component,
    {
        self.add_instance(Instance::new(value), true)
    }

    fn add_instance(&self, instance: Instance, read_only: bool) -> Result<()> {
        let key = instance.key();
        if self.scheduler.contains_unnamed(key.id()) {
            return Err(Error::DuplicateRegistration(Key::Type(key)));
        }
        self.registry.insert(instance, read_only)?;
        if self.options().debug_logging {
            debug!(ty = key.name(), read_only, "instance registered");
        }
        Ok(())
    }

    /// Registers a factory.
    ///
    /// The factory takes `Arc`s of its inputs and returns a [`FactoryOutput`]. A factory
    /// without inputs runs immediately; others run during [`init`](Self::init), once every
    /// input is bound, in whatever order their inputs allow.
    ///
    /// A named output is bound under its name only, so it neither satisfies inputs of its
    /// type nor conflicts with other bindings of its type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if the type of an unnamed output is already
    /// bound or pending, [`Error::InvalidFactorySignature`] if the factory takes its own output, and
    /// any error from running a factory without inputs.
    pub fn register_factory<C, T>(&self, constructor: C) -> Result<()>
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        self.add_factory(PendingFactory::new(constructor, false))
    }

    /// Registers a factory whose output is read-only, see
    /// [`register_read_only_instance`](Self::register_read_only_instance).
    ///
    /// # Errors
    ///
    /// Same as [`register_factory`](Self::register_factory).
    pub fn register_read_only_factory<C, T>(&self, constructor: C) -> Result<()>
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        self.add_factory(PendingFactory::new(constructor, true))
    }

    fn add_factory(&self, factory: PendingFactory) -> Result<()> {
        factory.validate()?;

        let output = factory.output();
        if !factory.is_named()
            && (self.registry.contains(output.id()) || self.scheduler.contains_unnamed(output.id()))
        {
            return Err(Error::DuplicateRegistration(Key::Type(output)));
        }

        let debug_logging = self.options().debug_logging;
        if factory.inputs().is_empty() {
            let produced = factory.run(&self.registry)?;
            if debug_logging {
                debug!(ty = output.name(), name = ?produced.name, "factory invoked");
            }
        } else {
            if debug_logging {
                debug!(ty = output.name(), inputs = factory.inputs().len(), "factory pending");
            }
            self.scheduler.push(factory);
        }
        Ok(())
    }

    /// Runs every registrant in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn register_all<I>(&self, registrants: I) -> Result<()>
    where
        I: IntoIterator<Item = Registrant>,
    {
        registrants
            .into_iter()
            .try_for_each(|registrant| (registrant.register)(self))
    }

    /// Uses `Q` for the interface fields of `C` that more than one type implements.
    ///
    /// `Q` is a component type, or the interface itself to pick a value bound by a
    /// [`Provided`](crate::factory::Provided) factory. `C` holds a single override. Mapping
    /// it again replaces the previous one.
    pub fn map_implementation<C, Q>(&self)
    where
        C: Component,
        Q: ?Sized + 'static,
    {
        let consumer = TypeKey::of::<C>();
        let implementation = TypeKey::of::<Q>();
        if let Some(previous) = self.overrides.insert(consumer, implementation) {
            warn!(
                consumer = consumer.name(),
                previous = previous.name(),
                implementation = implementation.name(),
                "implementation override replaced"
            );
        }
    }

    /// Invokes pending factories, then fills the fields of every registered component.
    ///
    /// Same as [`init_with`](Self::init_with) in [`Strictness::Strict`].
    ///
    /// # Errors
    ///
    /// See [`init_with`](Self::init_with).
    pub fn init(&self) -> Result<()> {
        self.init_with(Strictness::Strict)
    }

    /// Invokes pending factories, then fills the fields of every registered component.
    ///
    /// Factories whose inputs never become available stay pending. Fields are filled by
    /// name, by interface or by type, auto-creating missing dependencies if enabled.
    ///
    /// # Errors
    ///
    /// Returns any factory error and any error for a named field. In strict mode, also
    /// returns [`Error::CyclicOrUnresolvedDependency`] for factories left pending and the
    /// first field that cannot be resolved.
    pub fn init_with(&self, strictness: Strictness) -> Result<()> {
        let options = self.options();

        let unresolved = self.scheduler.run(&self.registry, options.debug_logging)?;
        if !unresolved.is_empty() {
            let outputs: Vec<&'static str> = unresolved.iter().map(TypeKey::name).collect();
            if strictness.is_strict() {
                return Err(Error::CyclicOrUnresolvedDependency(outputs));
            }
            warn!(?outputs, "factories left pending");
        }

        let injector = self.injector(options, strictness);
        for root in self.registry.roots() {
            injector.build(root.component(), root.key())?;
        }

        if options.debug_logging {
            info!(
                bindings = self.registry.len(),
                edges = self.graph.edge_count(),
                "container initialized"
            );
        }
        Ok(())
    }

    fn injector(&self, options: Options, strictness: Strictness) -> Injector<'_> {
        Injector::new(
            &self.registry,
            InterfaceResolver::new(&self.registry, &self.overrides),
            &self.catalog,
            &self.graph,
            options,
            strictness,
        )
    }

    /// Returns the instance bound to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `T` is not bound.
    pub fn get<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<T>().ok_or_else(|| {
            warn!(ty = type_name::<T>(), "binding not found, was init called?");
            Error::NotFound(Key::of::<T>())
        })
    }

    #[inline]
    pub fn try_get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.get_typed::<T>()
    }

    /// Returns the instance bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound to `name` or the binding is not a
    /// `T`.
    pub fn get_named<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_get_named::<T>(name).ok_or_else(|| {
            warn!(name, ty = type_name::<T>(), "binding not found, was init called?");
            Error::NotFound(Key::name(name))
        })
    }

    #[inline]
    pub fn try_get_named<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.get_typed_by_name::<T>(name)
    }

    /// Fills the fields of a component that is not registered, in lenient mode.
    ///
    /// # Errors
    ///
    /// Returns errors for named fields only, see [`di_with`](Self::di_with).
    pub fn di<T>(&self, component: &T) -> Result<()>
    where
        T: Component,
    {
        self.di_with(component, Strictness::Lenient)
    }

    /// Fills the fields of a component that is not registered.
    ///
    /// The component itself is not bound, but dependencies auto-created for it are.
    ///
    /// # Errors
    ///
    /// Returns any error for a named field and, in strict mode, the first field that cannot
    /// be resolved.
    pub fn di_with<T>(&self, component: &T, strictness: Strictness) -> Result<()>
    where
        T: Component,
    {
        self.injector(self.options(), strictness)
            .build(component, TypeKey::of::<T>())
    }

    /// Calls `f` with its `Arc` parameters resolved from the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDependency`] naming the first parameter type that is not
    /// bound.
    pub fn invoke<C, T>(&self, f: C) -> Result<C::Constructed>
    where
        C: Constructor<T>,
        T: Resolve,
    {
        match T::resolve(&self.registry) {
            Some(param) => Ok(f.construct(param)),
            None => {
                let missing = T::keys()
                    .into_iter()
                    .find(|key| !self.registry.contains(key.id()))
                    .map_or(type_name::<T>(), |key| key.name());
                Err(Error::UnresolvedDependency {
                    ty: missing,
                    required_by: format!("invoked function `{}`", type_name::<C>()),
                })
            }
        }
    }

    /// Renders the dependency graph recorded so far in the DOT language.
    pub fn graph(&self) -> String {
        self.graph.render()
    }

    /// Returns the resolved fields recorded so far.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph.edges()
    }

    /// Returns the number of factories waiting for inputs.
    pub fn pending_factories(&self) -> usize {
        self.scheduler.len()
    }

    /// Drops every binding, pending factory, override and recorded edge.
    pub fn shutdown(&self) {
        self.registry.clear();
        self.scheduler.clear();
        self.overrides.clear();
        self.graph.clear();
        if self.options().debug_logging {
            info!("container shut down");
        }
    }
}

type Register = Box<dyn FnOnce(&Container) -> Result<()> + Send>;

/// A deferred registration, for [`Container::register_all`] and [`ContainerBuilder`].
pub struct Registrant {
    register: Register,
}

impl Registrant {
    fn new<F>(register: F) -> Self
    where
        F: FnOnce(&Container) -> Result<()> + Send + 'static,
    {
        Self {
            register: Box::new(register),
        }
    }

    pub fn instance<T>(value: Arc<T>) -> Self
    where
        T: Component,
    {
        Self::new(move |container| container.register_instance(value))
    }

    pub fn read_only_instance<T>(value: Arc<T>) -> Self
    where
        T: Component,
    {
        Self::new(move |container| container.register_read_only_instance(value))
    }

    pub fn factory<C, T>(constructor: C) -> Self
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        Self::new(move |container| container.register_factory(constructor))
    }

    pub fn read_only_factory<C, T>(constructor: C) -> Self
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        Self::new(move |container| container.register_read_only_factory(constructor))
    }
}

impl std::fmt::Debug for Registrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrant").finish_non_exhaustive()
    }
}

type MapImplementation = Box<dyn FnOnce(&Container) + Send>;

/// A builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    options: Options,
    catalog: Option<Catalog>,
    registrants: Vec<Registrant>,
    implementations: Vec<MapImplementation>,
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("options", &self.options)
            .field("catalog", &self.catalog)
            .field("registrants", &self.registrants.len())
            .field("implementations", &self.implementations.len())
            .finish()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Replaces the [linked](Catalog::linked) catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_registrant(mut self, registrant: Registrant) -> Self {
        self.registrants.push(registrant);
        self
    }

    #[must_use]
    pub fn with_instance<T>(self, value: Arc<T>) -> Self
    where
        T: Component,
    {
        self.with_registrant(Registrant::instance(value))
    }

    #[must_use]
    pub fn with_read_only_instance<T>(self, value: Arc<T>) -> Self
    where
        T: Component,
    {
        self.with_registrant(Registrant::read_only_instance(value))
    }

    #[must_use]
    pub fn with_factory<C, T>(self, constructor: C) -> Self
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        self.with_registrant(Registrant::factory(constructor))
    }

    #[must_use]
    pub fn with_read_only_factory<C, T>(self, constructor: C) -> Self
    where
        C: Constructor<T> + Send + 'static,
        C::Constructed: FactoryOutput,
        T: Resolve + 'static,
    {
        self.with_registrant(Registrant::read_only_factory(constructor))
    }

    /// See [`Container::map_implementation`].
    #[must_use]
    pub fn with_implementation<C, Q>(mut self) -> Self
    where
        C: Component,
        Q: ?Sized + 'static,
    {
        self.implementations
            .push(Box::new(|container| container.map_implementation::<C, Q>()));
        self
    }

    /// Registers everything and initializes the container in strict mode.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, or any error from [`Container::init`].
    pub fn build(self) -> Result<Container> {
        let Self {
            options,
            catalog,
            registrants,
            implementations,
        } = self;

        let container = Container::from_parts(options, catalog.unwrap_or_else(Catalog::linked));
        for map in implementations {
            map(&container);
        }
        container.register_all(registrants)?;
        container.init()?;
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wired_core::{Dep, Field, Interfaces};

    use super::*;
    use crate::factory::Provided;

    trait Speaker: Send + Sync {
        fn speak(&self) -> &'static str;
    }

    #[derive(Default)]
    struct Quiet;

    #[derive(Default)]
    struct Zealous;

    impl Speaker for Quiet {
        fn speak(&self) -> &'static str {
            "q"
        }
    }

    impl Speaker for Zealous {
        fn speak(&self) -> &'static str {
            "z"
        }
    }

    impl Component for Quiet {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Speaker>(|this| this)
        }

        fn auto_create() -> Option<Self> {
            Some(Self)
        }
    }

    impl Component for Zealous {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Speaker>(|this| this)
        }
    }

    #[derive(Default)]
    struct Consumer {
        speaker: Dep<dyn Speaker>,
    }

    impl Component for Consumer {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::interface("speaker", &self.speaker)]
        }
    }

    #[derive(Debug)]
    struct Alpha(u32);
    #[derive(Debug)]
    struct Beta {
        alpha: Arc<Alpha>,
    }

    impl Component for Alpha {}
    impl Component for Beta {}

    #[derive(Default)]
    struct Delta {
        value: u32,
    }

    impl Component for Delta {
        fn auto_create() -> Option<Self> {
            Some(Self::default())
        }
    }

    #[derive(Default)]
    struct UsesDelta {
        delta: Dep<Delta>,
    }

    impl Component for UsesDelta {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::new("delta", &self.delta)]
        }
    }

    #[derive(Default)]
    struct Greeter {
        greeting: Dep<String>,
    }

    impl Component for Greeter {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::new("greeting", &self.greeting).named("greeting")]
        }
    }

    fn explicit() -> Container {
        Container::with_catalog(Catalog::new())
    }

    #[test]
    fn test_get_is_idempotent() {
        let container = explicit();
        container.register_instance(Arc::new(Alpha(1))).unwrap();
        container.init().unwrap();

        let first = container.get::<Alpha>().unwrap();
        let second = container.get::<Alpha>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(container.get::<Beta>().unwrap_err().is_not_found());
        assert!(container.try_get::<Beta>().is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let container = explicit();
        container.register_instance(Arc::new(Alpha(1))).unwrap();
        let err = container.register_instance(Arc::new(Alpha(2))).unwrap_err();
        assert!(err.is_duplicate_registration());
        let err = container.register_factory(|| Arc::new(Alpha(3))).unwrap_err();
        assert!(err.is_duplicate_registration());

        let container = explicit();
        container
            .register_factory(|alpha: Arc<Alpha>| Arc::new(Beta { alpha }))
            .unwrap();
        let err = container
            .register_factory(|alpha: Arc<Alpha>| Arc::new(Beta { alpha }))
            .unwrap_err();
        assert!(err.is_duplicate_registration());
        let err = container
            .register_instance(Arc::new(Beta {
                alpha: Arc::new(Alpha(0)),
            }))
            .unwrap_err();
        assert!(err.is_duplicate_registration());
    }

    #[test]
    fn test_factory_order_independence() {
        for alpha_first in [true, false] {
            let container = explicit();
            let register_alpha = |container: &Container| {
                container.register_factory(|| Arc::new(Alpha(7))).unwrap();
            };
            if alpha_first {
                register_alpha(&container);
            }
            container
                .register_factory(|alpha: Arc<Alpha>| Arc::new(Beta { alpha }))
                .unwrap();
            if !alpha_first {
                register_alpha(&container);
            }
            container.init().unwrap();

            let beta = container.get::<Beta>().unwrap();
            let alpha = container.get::<Alpha>().unwrap();
            assert!(Arc::ptr_eq(&beta.alpha, &alpha));
            assert_eq!(beta.alpha.0, 7);
            assert_eq!(container.pending_factories(), 0);
        }
    }

    #[test]
    fn test_ambiguity_requires_override() {
        let register = |container: &Container| {
            container.register_instance(Arc::new(Quiet)).unwrap();
            container.register_instance(Arc::new(Zealous)).unwrap();
            container
                .register_instance(Arc::new(Consumer::default()))
                .unwrap();
        };

        let container = explicit();
        register(&container);
        match container.init().unwrap_err() {
            Error::AmbiguousImplementation { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].ends_with("Quiet"));
                assert!(candidates[1].ends_with("Zealous"));
            }
            err => panic!("unexpected error: {err}"),
        }

        let container = explicit();
        register(&container);
        container.map_implementation::<Consumer, Quiet>();
        container.init().unwrap();
        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "q");
    }

    #[test]
    fn test_auto_create() {
        let container = explicit();
        container
            .register_instance(Arc::new(UsesDelta::default()))
            .unwrap();
        container.init().unwrap();

        let consumer = container.get::<UsesDelta>().unwrap();
        let delta = container.get::<Delta>().unwrap();
        assert!(Arc::ptr_eq(consumer.delta.get().unwrap(), &delta));
        assert_eq!(delta.value, 0);
    }

    #[test]
    fn test_unresolved_field() {
        let container = Container::from_parts(
            Options::new().with_auto_create(false),
            Catalog::new(),
        );
        container
            .register_instance(Arc::new(UsesDelta::default()))
            .unwrap();
        assert!(container.init().unwrap_err().is_unresolved_dependency());

        container.init_with(Strictness::Lenient).unwrap();
        assert!(!container.get::<UsesDelta>().unwrap().delta.is_set());
        assert!(container.edges().is_empty());
        assert!(!container.graph().contains("->"));
    }

    #[test]
    fn test_named_binding() {
        let container = explicit();
        container
            .register_factory(|| (Arc::new("hello".to_string()), "greeting"))
            .unwrap();
        container
            .register_instance(Arc::new(Greeter::default()))
            .unwrap();
        container.init().unwrap();

        let greeting = container.get_named::<String>("greeting").unwrap();
        let greeter = container.get::<Greeter>().unwrap();
        assert!(Arc::ptr_eq(greeter.greeting.get().unwrap(), &greeting));
        assert!(container.get_named::<u32>("greeting").unwrap_err().is_not_found());

        let err = container
            .register_factory(|| (Arc::new(1_u8), ""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRegistrant(_)));
    }

    #[test]
    fn test_graph_has_one_edge_per_injected_field() {
        let container = explicit();
        container
            .register_instance(Arc::new(UsesDelta::default()))
            .unwrap();
        container.register_instance(Arc::new(Quiet)).unwrap();
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();
        container.init().unwrap();
        // A second pass finds every field set.
        container.init().unwrap();

        let edges = container.edges();
        assert_eq!(edges.len(), 2);
        let graph = container.graph();
        assert_eq!(graph.matches("->").count(), 2);
        assert!(graph.contains(type_name::<UsesDelta>()));
    }

    struct Left(#[allow(dead_code)] Arc<Right>);
    struct Right(#[allow(dead_code)] Arc<Left>);

    impl Component for Left {}
    impl Component for Right {}

    #[test]
    fn test_cyclic_factories() {
        let container = explicit();
        container
            .register_factory(|right: Arc<Right>| Arc::new(Left(right)))
            .unwrap();
        container
            .register_factory(|left: Arc<Left>| Arc::new(Right(left)))
            .unwrap();

        assert!(
            container
                .init()
                .unwrap_err()
                .is_cyclic_or_unresolved_dependency()
        );
        container.init_with(Strictness::Lenient).unwrap();
        assert_eq!(container.pending_factories(), 2);
        assert!(container.try_get::<Left>().is_none());
    }

    #[test]
    fn test_factory_error() {
        let container = explicit();
        container.register_instance(Arc::new(Alpha(1))).unwrap();
        container
            .register_factory(|_: Arc<Alpha>| -> Result<Arc<Beta>, std::io::Error> {
                Err(std::io::Error::other("no beta"))
            })
            .unwrap();
        let err = container.init_with(Strictness::Lenient).unwrap_err();
        assert!(err.is_factory());
        assert!(err.to_string().contains("no beta"));

        let err = container
            .register_factory(|| -> Result<Arc<Delta>, String> { Err("no delta".into()) })
            .unwrap_err();
        assert!(err.is_factory());
    }

    #[test]
    fn test_self_input_factory_is_rejected() {
        let container = explicit();
        let err = container
            .register_factory(|alpha: Arc<Alpha>| alpha)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySignature(_, _)));
    }

    #[test]
    fn test_invoke() {
        let container = explicit();
        container.register_instance(Arc::new(Alpha(20))).unwrap();

        let sum = container
            .invoke(|alpha: Arc<Alpha>| alpha.0 + 1)
            .unwrap();
        assert_eq!(sum, 21);

        let err = container
            .invoke(|_: Arc<Alpha>, _: Arc<Beta>| ())
            .unwrap_err();
        match err {
            Error::UnresolvedDependency { ty, .. } => assert_eq!(ty, type_name::<Beta>()),
            err => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn test_di_does_not_register_the_target() {
        let container = explicit();
        let consumer = UsesDelta::default();
        container.di(&consumer).unwrap();

        assert!(consumer.delta.is_set());
        assert!(container.try_get::<UsesDelta>().is_none());
        assert!(Arc::ptr_eq(
            consumer.delta.get().unwrap(),
            &container.get::<Delta>().unwrap()
        ));

        let greeter = Greeter::default();
        assert!(container.di(&greeter).unwrap_err().is_named_dependency_not_found());
    }

    #[test]
    fn test_read_only_is_not_a_candidate() {
        let container = explicit();
        container.register_read_only_instance(Arc::new(Quiet)).unwrap();
        container.register_instance(Arc::new(Zealous)).unwrap();
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();
        container.init().unwrap();

        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "z");
        assert!(container.get::<Quiet>().is_ok());
    }

    #[test]
    fn test_catalog_discovery() {
        let container = Container::with_catalog(Catalog::new().with::<Quiet>().with::<Zealous>());
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();
        container.init().unwrap();

        // Zealous cannot be auto-created, so Quiet is the only candidate.
        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "q");
        assert!(container.try_get::<Quiet>().is_some());
        assert!(container.try_get::<Zealous>().is_none());

        let container = Container::with_catalog(Catalog::new().with::<Quiet>());
        container.set_auto_create(false);
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();
        assert!(container.init().unwrap_err().is_unresolved_dependency());
    }

    #[test]
    fn test_named_output_leaves_its_type_free() {
        fn named(container: &Container) {
            container
                .register_factory(|| (Arc::new("hi".to_string()), "greeting"))
                .unwrap();
        }

        for named_first in [true, false] {
            let container = explicit();
            if named_first {
                named(&container);
            }
            container.register_instance(Arc::new("x".to_string())).unwrap();
            if !named_first {
                named(&container);
            }
            container.init().unwrap();

            assert_eq!(*container.get::<String>().unwrap(), "x");
            assert_eq!(*container.get_named::<String>("greeting").unwrap(), "hi");
        }
    }

    #[derive(Debug)]
    struct Seed;
    #[derive(Debug)]
    struct Out(u32);

    impl Component for Seed {}
    impl Component for Out {}

    #[test]
    fn test_named_and_unnamed_factories_of_one_type() {
        fn named(container: &Container) {
            container
                .register_factory(|_: Arc<Seed>| (Arc::new(Out(1)), "out"))
                .unwrap();
        }

        fn unnamed(container: &Container) {
            container
                .register_factory(|_: Arc<Seed>| Arc::new(Out(2)))
                .unwrap();
        }

        for named_first in [true, false] {
            let container = explicit();
            container.register_instance(Arc::new(Seed)).unwrap();
            if named_first {
                named(&container);
                unnamed(&container);
            } else {
                unnamed(&container);
                named(&container);
            }
            container.init().unwrap();

            assert_eq!(container.get::<Out>().unwrap().0, 2);
            assert_eq!(container.get_named::<Out>("out").unwrap().0, 1);
            assert_eq!(container.pending_factories(), 0);
        }
    }

    #[test]
    fn test_interface_factory_output() {
        let container = explicit();
        container.register_instance(Arc::new(Alpha(4))).unwrap();
        container
            .register_factory(|_: Arc<Alpha>| Provided(Arc::new(Zealous) as Arc<dyn Speaker>))
            .unwrap();
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();
        container.init().unwrap();

        let speaker = container.get::<dyn Speaker>().unwrap();
        let consumer = container.get::<Consumer>().unwrap();
        assert!(Arc::ptr_eq(consumer.speaker.get().unwrap(), &speaker));
        assert_eq!(consumer.speaker.speak(), "z");
        assert!(container.try_get::<Zealous>().is_none());

        let spoken = container
            .invoke(|speaker: Arc<dyn Speaker>| speaker.speak())
            .unwrap();
        assert_eq!(spoken, "z");

        let err = container
            .register_factory(|| Provided(Arc::new(Quiet) as Arc<dyn Speaker>))
            .unwrap_err();
        assert!(err.is_duplicate_registration());
    }

    #[test]
    fn test_interface_factory_output_competes_with_components() {
        let container = explicit();
        container.register_instance(Arc::new(Quiet)).unwrap();
        container
            .register_factory(|| Provided(Arc::new(Zealous) as Arc<dyn Speaker>))
            .unwrap();
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();

        match container.init().unwrap_err() {
            Error::AmbiguousImplementation { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&type_name::<dyn Speaker>()));
            }
            err => panic!("unexpected error: {err}"),
        }

        container.map_implementation::<Consumer, dyn Speaker>();
        container.init().unwrap();
        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "z");
    }

    #[derive(Default)]
    struct Loud;

    impl Speaker for Loud {
        fn speak(&self) -> &'static str {
            "l"
        }
    }

    impl Component for Loud {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Speaker>(|this| this)
        }

        fn auto_create() -> Option<Self> {
            Some(Self)
        }
    }

    #[test]
    fn test_discovery_can_be_ambiguous() {
        let container = Container::with_catalog(Catalog::new().with::<Quiet>().with::<Loud>());
        container
            .register_instance(Arc::new(Consumer::default()))
            .unwrap();

        match container.init().unwrap_err() {
            Error::AmbiguousImplementation { candidates, .. } => {
                assert_eq!(candidates, vec![type_name::<Loud>(), type_name::<Quiet>()]);
            }
            err => panic!("unexpected error: {err}"),
        }
        // Both implementations were bound by the single discovery pass.
        assert!(container.try_get::<Loud>().is_some());
        assert!(container.try_get::<Quiet>().is_some());

        container.map_implementation::<Consumer, Loud>();
        container.init().unwrap();
        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "l");
    }

    #[test]
    fn test_lenient_init_requires_named_fields() {
        let container = explicit();
        container
            .register_instance(Arc::new(Greeter::default()))
            .unwrap();

        let err = container.init_with(Strictness::Lenient).unwrap_err();
        assert!(err.is_named_dependency_not_found());
        assert!(err.to_string().contains("greeting"));
    }

    #[derive(Default)]
    struct Ping {
        pong: Dep<Pong>,
    }

    #[derive(Default)]
    struct Pong {
        ping: Dep<Ping>,
    }

    impl Component for Ping {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::new("pong", &self.pong)]
        }

        fn auto_create() -> Option<Self> {
            Some(Self::default())
        }
    }

    impl Component for Pong {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::new("ping", &self.ping)]
        }

        fn auto_create() -> Option<Self> {
            Some(Self::default())
        }
    }

    #[test]
    fn test_auto_created_cycle() {
        let container = explicit();
        container.register_instance(Arc::new(Ping::default())).unwrap();
        container.init().unwrap();

        let ping = container.get::<Ping>().unwrap();
        let pong = container.get::<Pong>().unwrap();
        assert!(Arc::ptr_eq(ping.pong.get().unwrap(), &pong));
        assert!(Arc::ptr_eq(pong.ping.get().unwrap(), &ping));
        assert_eq!(container.edges().len(), 2);
    }

    trait Beep: Send + Sync {}

    #[derive(Default)]
    struct Buzzer;

    impl Beep for Buzzer {}

    impl Component for Buzzer {
        fn interfaces() -> Interfaces<Self> {
            Interfaces::new().with::<dyn Beep>(|this| this)
        }

        fn auto_create() -> Option<Self> {
            Some(Self)
        }
    }

    crate::catalog!(Buzzer);

    #[derive(Default)]
    struct Alarm {
        beep: Dep<dyn Beep>,
    }

    impl Component for Alarm {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::interface("beep", &self.beep)]
        }
    }

    #[test]
    fn test_linked_catalog_discovery() {
        let container = Container::new();
        let alarm = Alarm::default();
        container.di_with(&alarm, Strictness::Strict).unwrap();
        assert!(alarm.beep.is_set());
        assert!(container.try_get::<Buzzer>().is_some());
    }

    #[test]
    fn test_shutdown() {
        let container = explicit();
        container.register_instance(Arc::new(UsesDelta::default())).unwrap();
        container.map_implementation::<Consumer, Quiet>();
        container.init().unwrap();
        assert!(!container.edges().is_empty());

        container.shutdown();
        assert!(container.try_get::<UsesDelta>().is_none());
        assert!(container.edges().is_empty());
        container.register_instance(Arc::new(UsesDelta::default())).unwrap();
    }

    #[test]
    fn test_builder() {
        let container = Container::builder()
            .with_catalog(Catalog::new())
            .with_options(Options::new().with_debug_logging(false))
            .with_instance(Arc::new(Quiet))
            .with_instance(Arc::new(Zealous))
            .with_instance(Arc::new(Consumer::default()))
            .with_factory(|| Arc::new(Alpha(3)))
            .with_read_only_factory(|alpha: Arc<Alpha>| Arc::new(Beta { alpha }))
            .with_implementation::<Consumer, Zealous>()
            .build()
            .unwrap();

        assert!(!container.options().debug_logging);
        assert_eq!(container.get::<Consumer>().unwrap().speaker.speak(), "z");
        assert_eq!(container.get::<Beta>().unwrap().alpha.0, 3);

        let err = Container::builder()
            .with_catalog(Catalog::new())
            .with_instance(Arc::new(Alpha(1)))
            .with_instance(Arc::new(Alpha(2)))
            .build()
            .unwrap_err();
        assert!(err.is_duplicate_registration());
    }

    #[test]
    fn test_register_all() {
        let container = explicit();
        container
            .register_all([
                Registrant::factory(|alpha: Arc<Alpha>| Arc::new(Beta { alpha })),
                Registrant::instance(Arc::new(Alpha(5))),
                Registrant::read_only_instance(Arc::new(Quiet)),
            ])
            .unwrap();
        container.init().unwrap();
        assert_eq!(container.get::<Beta>().unwrap().alpha.0, 5);
    }

    struct Counted {
        delta: Dep<Delta>,
        visits: AtomicUsize,
    }

    impl Component for Counted {
        fn fields(&self) -> Vec<Field<'_>> {
            self.visits.fetch_add(1, Ordering::Relaxed);
            vec![Field::new("delta", &self.delta)]
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookup_and_di() {
        let container = Arc::new(explicit());
        container.register_instance(Arc::new(Alpha(9))).unwrap();
        container.init().unwrap();
        let alpha = container.get::<Alpha>().unwrap();

        let shared = Arc::new(Counted {
            delta: Dep::new(),
            visits: AtomicUsize::new(0),
        });

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let container = Arc::clone(&container);
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    container.di(&*shared).unwrap();
                    container.get::<Alpha>().unwrap()
                })
            })
            .collect();

        for task in tasks {
            assert!(Arc::ptr_eq(&task.await.unwrap(), &alpha));
        }

        let delta = container.get::<Delta>().unwrap();
        assert!(Arc::ptr_eq(shared.delta.get().unwrap(), &delta));
        assert_eq!(shared.visits.load(Ordering::Relaxed), 16);
        assert_eq!(container.edges().len(), 1);
    }
}
