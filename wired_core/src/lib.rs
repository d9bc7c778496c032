//! Core types and traits for `wired` library.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub mod component;
pub mod erased;
pub mod error;
pub mod key;

pub use component::{
    Cast, Component, Dep, Field, FieldKind, Instance, Interfaces, Slot, create_instance,
};
pub use erased::Erased;
pub use error::{Error, Result};
pub use key::{Key, TypeKey};
