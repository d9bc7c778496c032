//! Dependency injection container that wires `Arc` component graphs.
//!
//! Components declare their injectable [`Dep`] fields and the interfaces they implement
//! through [`Component`]. A [`Container`] holds registered instances and factories, invokes
//! the factories once their inputs are available, then fills every field by name, by
//! interface or by type, auto-creating missing dependencies when allowed.
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub use wired_core::{
    Cast, Component, Dep, Erased, Error, Field, FieldKind, Instance, Interfaces, Key, Result,
    Slot, TypeKey,
};

#[macro_use]
pub(crate) mod macros;

pub mod catalog;
pub mod container;
pub mod factory;
pub mod graph;
pub mod options;
pub mod registry;
pub mod resolver;

mod injector;
mod scheduler;

pub use catalog::Catalog;
pub use container::{Container, ContainerBuilder, Registrant};
pub use factory::Provided;
pub use options::{Options, Strictness};

#[doc(hidden)]
pub mod __private {
    pub use linkme;
}
