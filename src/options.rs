//! Container configuration.

/// Switches that change how a [`Container`](crate::Container) resolves dependencies.
///
/// Options are read when [`init`](crate::Container::init) or [`di`](crate::Container::di)
/// starts, so changing them mid-initialization has no effect on the running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Create missing dependencies from their zero value instead of reporting them.
    pub auto_create: bool,
    /// Log every binding and every injected field.
    pub debug_logging: bool,
    /// Skip fields marked [`private`](wired_core::Field::private).
    pub ignore_private_fields: bool,
}

impl Options {
    pub const fn new() -> Self {
        Self {
            auto_create: true,
            debug_logging: true,
            ignore_private_fields: false,
        }
    }

    #[must_use]
    pub const fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    #[must_use]
    pub const fn with_debug_logging(mut self, debug_logging: bool) -> Self {
        self.debug_logging = debug_logging;
        self
    }

    #[must_use]
    pub const fn with_ignore_private_fields(mut self, ignore_private_fields: bool) -> Self {
        self.ignore_private_fields = ignore_private_fields;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

/// What happens when a dependency cannot be resolved.
///
/// Registration errors, failing factories and missing named bindings are returned
/// regardless of strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Stop and return the first resolution error.
    #[default]
    Strict,
    /// Log a warning and leave the field empty.
    Lenient,
}

impl Strictness {
    #[inline]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}
