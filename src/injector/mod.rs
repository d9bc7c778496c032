//! Recursive field injection.

use wired_core::{Component, Error, Field, FieldKind, Instance, Result, TypeKey};

use crate::catalog::Catalog;
use crate::graph::Graph;
use crate::options::{Options, Strictness};
use crate::registry::Registry;
use crate::resolver::{InterfaceResolver, Resolution};

/// Walks the fields of components and fills them from a [`Registry`].
///
/// Every resolved field is recorded in the [`Graph`]. Auto-created dependencies are bound
/// in the registry before they are walked, so dependency cycles end at the second visit.
pub(crate) struct Injector<'a> {
    registry: &'a Registry,
    resolver: InterfaceResolver<'a>,
    catalog: &'a Catalog,
    graph: &'a Graph,
    options: Options,
    strictness: Strictness,
}

impl<'a> Injector<'a> {
    pub(crate) const fn new(
        registry: &'a Registry,
        resolver: InterfaceResolver<'a>,
        catalog: &'a Catalog,
        graph: &'a Graph,
        options: Options,
        strictness: Strictness,
    ) -> Self {
        Self {
            registry,
            resolver,
            catalog,
            graph,
            options,
            strictness,
        }
    }

    /// Fills every empty field of `component`, whose concrete type is `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NamedDependencyNotFound`] and [`Error::InvalidRegistrant`] for bad
    /// named fields in any mode, and the first unresolved field in strict mode.
    pub(crate) fn build(&self, component: &dyn Component, owner: TypeKey) -> Result<()> {
        let fields = component.fields();
        self.graph.add_node(
            owner,
            fields
                .iter()
                .map(|field| (field.name(), field.ty().name()))
                .collect(),
        );

        for (index, field) in fields.iter().enumerate() {
            if field.is_private() && self.options.ignore_private_fields {
                trace!(field = field.name(), owner = owner.name(), "private field ignored");
                continue;
            }
            if field.slot().is_set() {
                continue;
            }

            let resolved = match field.binding() {
                Some(name) => Some(self.by_name(field, name, owner)?),
                None if field.is_interface() => self.by_interface(field, owner)?,
                None => self.by_type(field, owner)?,
            };
            let Some(instance) = resolved else {
                continue;
            };
            self.inject(index, field, &instance, owner)?;
        }
        Ok(())
    }

    fn inject(
        &self,
        index: usize,
        field: &Field<'_>,
        instance: &Instance,
        owner: TypeKey,
    ) -> Result<()> {
        let Some(value) = instance.erased_for(field) else {
            let err = Error::UnresolvedDependency {
                ty: field.ty().name(),
                required_by: required_by(field, owner),
            };
            return self.report(field, err).map(|_| ());
        };

        // A concurrent walk of the same component may have filled the slot first.
        if field.slot().set_erased(&value) {
            self.graph.add_edge(owner, index, instance.key());
            if self.options.debug_logging {
                debug!(
                    field = field.name(),
                    owner = owner.name(),
                    ty = instance.key().name(),
                    "field injected"
                );
            }
        }
        Ok(())
    }

    fn by_name(&self, field: &Field<'_>, name: &str, owner: TypeKey) -> Result<Instance> {
        if name.is_empty() {
            return Err(Error::InvalidRegistrant(format!(
                "{} is bound to an empty name",
                required_by(field, owner)
            )));
        }

        self.registry
            .get_by_name(name)
            .filter(|instance| instance.erased_for(field).is_some())
            .ok_or_else(|| Error::NamedDependencyNotFound {
                name: name.to_string(),
                expected: field.ty().name(),
                required_by: required_by(field, owner),
            })
    }

    fn by_type(&self, field: &Field<'_>, owner: TypeKey) -> Result<Option<Instance>> {
        if let Some(instance) = self.registry.get(field.ty().id()) {
            return Ok(Some(instance));
        }

        if self.options.auto_create {
            if let FieldKind::Concrete { create } = field.kind() {
                if let Some(created) = create() {
                    let instance = self.registry.insert_or_existing(created);
                    warn!(
                        ty = instance.key().name(),
                        field = field.name(),
                        owner = owner.name(),
                        "dependency auto-created"
                    );
                    self.build(instance.component(), instance.key())?;
                    return Ok(Some(instance));
                }
            }
        }

        self.report(
            field,
            Error::UnresolvedDependency {
                ty: field.ty().name(),
                required_by: required_by(field, owner),
            },
        )
    }

    fn by_interface(&self, field: &Field<'_>, owner: TypeKey) -> Result<Option<Instance>> {
        loop {
            match self.resolver.resolve(field.ty(), owner) {
                Resolution::Found(instance) => return Ok(Some(instance)),
                Resolution::Ambiguous(candidates) => {
                    let err = Error::AmbiguousImplementation {
                        interface: field.ty().name(),
                        required_by: required_by(field, owner),
                        candidates,
                    };
                    return self.report(field, err);
                }
                Resolution::NotFound => {
                    if self.options.auto_create && self.discover(field, owner)? {
                        continue;
                    }
                    let err = Error::UnresolvedDependency {
                        ty: field.ty().name(),
                        required_by: required_by(field, owner),
                    };
                    return self.report(field, err);
                }
            }
        }
    }

    /// Auto-creates every unregistered cataloged type implementing the interface of
    /// `field`. Returns `true` if anything new was bound.
    fn discover(&self, field: &Field<'_>, owner: TypeKey) -> Result<bool> {
        let mut added = false;
        for entry in self.catalog.implementors(field.ty().id()) {
            if self.registry.contains(entry.key().id()) {
                continue;
            }
            let Some(created) = entry.create() else {
                continue;
            };

            let instance = self.registry.insert_or_existing(created);
            warn!(
                ty = instance.key().name(),
                interface = field.ty().name(),
                field = field.name(),
                owner = owner.name(),
                "implementation auto-created"
            );
            self.build(instance.component(), instance.key())?;
            added = true;
        }
        Ok(added)
    }

    /// Reports a field that cannot be filled.
    ///
    /// Unresolved optional fields are skipped. Otherwise strict mode returns the error, and
    /// lenient mode leaves the field empty.
    fn report(&self, field: &Field<'_>, err: Error) -> Result<Option<Instance>> {
        if field.is_optional() && err.is_unresolved_dependency() {
            warn!(field = field.name(), error = %err, "optional field left empty");
            return Ok(None);
        }
        if self.strictness.is_strict() {
            return Err(err);
        }
        warn!(field = field.name(), error = %err, "field left empty");
        Ok(None)
    }
}

fn required_by(field: &Field<'_>, owner: TypeKey) -> String {
    format!("field `{}` of `{}`", field.name(), owner.name())
}
