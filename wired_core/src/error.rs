//! Error types.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::key::Key;

/// [`Error`] is an error that can be raised by functions and methods from this library.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A registrant cannot be bound, e.g. because its name is empty.
    InvalidRegistrant(String),
    /// A type or a name is bound twice.
    DuplicateRegistration(Key),
    /// A factory can never be invoked, e.g. because it requires its own output.
    InvalidFactorySignature(&'static str, String),
    /// A factory returned an error. Carries the output type of the factory.
    Factory(&'static str, Arc<dyn StdError + Send + Sync + 'static>),
    /// An explicitly named dependency has no binding of the expected type.
    NamedDependencyNotFound {
        /// The binding name of the field.
        name: String,
        /// The declared type of the field.
        expected: &'static str,
        /// The field and its owner.
        required_by: String,
    },
    /// More than one implementation satisfies an interface, and no override picks one.
    AmbiguousImplementation {
        /// The interface of the field.
        interface: &'static str,
        /// The field and its owner.
        required_by: String,
        /// Names of the implementing types, sorted.
        candidates: Vec<&'static str>,
    },
    /// A dependency cannot be resolved.
    UnresolvedDependency {
        /// The missing type.
        ty: &'static str,
        /// The field or the function that needs it.
        required_by: String,
    },
    /// Pending factories whose inputs never became available.
    CyclicOrUnresolvedDependency(Vec<&'static str>),
    /// A lookup found no binding.
    NotFound(Key),
    /// Any other error, e.g. raised by a registrant.
    Other(Arc<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    pub fn factory<T, E>(err: E) -> Self
    where
        T: ?Sized + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Factory(type_name::<T>(), Arc::from(err.into()))
    }

    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Other(Arc::from(err.into()))
    }

    pub const fn is_duplicate_registration(&self) -> bool {
        matches!(self, Self::DuplicateRegistration(_))
    }

    pub const fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_, _))
    }

    pub const fn is_named_dependency_not_found(&self) -> bool {
        matches!(self, Self::NamedDependencyNotFound { .. })
    }

    pub const fn is_ambiguous_implementation(&self) -> bool {
        matches!(self, Self::AmbiguousImplementation { .. })
    }

    pub const fn is_unresolved_dependency(&self) -> bool {
        matches!(self, Self::UnresolvedDependency { .. })
    }

    pub const fn is_cyclic_or_unresolved_dependency(&self) -> bool {
        matches!(self, Self::CyclicOrUnresolvedDependency(_))
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegistrant(reason) => write!(f, "invalid registrant: {reason}"),
            Self::DuplicateRegistration(key) => write!(f, "{key} is registered twice"),
            Self::InvalidFactorySignature(output, reason) => {
                write!(f, "invalid factory for `{output}`: {reason}")
            }
            Self::Factory(output, error) => write!(f, "factory for `{output}` failed: {error}"),
            Self::NamedDependencyNotFound {
                name,
                expected,
                required_by,
            } => write!(
                f,
                "no binding named `{name}` of type `{expected}`, required by {required_by}"
            ),
            Self::AmbiguousImplementation {
                interface,
                required_by,
                candidates,
            } => write!(
                f,
                "more than one type implements `{interface}` [{}], required by {required_by}; \
                 map the consumer to one implementation",
                candidates.join(", ")
            ),
            Self::UnresolvedDependency { ty, required_by } => {
                write!(f, "`{ty}` cannot be resolved, required by {required_by}")
            }
            Self::CyclicOrUnresolvedDependency(outputs) => write!(
                f,
                "factories for [{}] have cyclic or unresolved inputs",
                outputs.join(", ")
            ),
            Self::NotFound(key) => write!(f, "{key} is not bound"),
            Self::Other(error) => error.fmt(f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Factory(_, error) | Self::Other(error) => Some(error),
            _ => None,
        }
    }
}

/// [`Result`] is an alias to [`core::result::Result`] with [`Error`] as the
/// default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
