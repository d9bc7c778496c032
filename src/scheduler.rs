//! Fixed-point resolution of pending factories.

use std::any::TypeId;
use std::sync::{Mutex, MutexGuard, PoisonError};

use wired_core::{Result, TypeKey};

use crate::factory::PendingFactory;
use crate::registry::Registry;

/// Factories waiting for their inputs, in registration order.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    pending: Mutex<Vec<PendingFactory>>,
}

impl Scheduler {
    pub(crate) const fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingFactory>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, factory: PendingFactory) {
        self.lock().push(factory);
    }

    /// Returns `true` if a pending factory will bind `type_id` under its type.
    pub(crate) fn contains_unnamed(&self, type_id: TypeId) -> bool {
        self.lock()
            .iter()
            .any(|factory| !factory.is_named() && factory.output().id() == type_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    /// Invokes every factory whose inputs are bound, until a pass binds nothing new.
    ///
    /// Runs at most `N²` passes for `N` pending factories. Factories that never become
    /// ready stay pending; their output types are returned sorted by name.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a factory or by binding its output. Factories not
    /// invoked yet stay pending.
    pub(crate) fn run(&self, registry: &Registry, debug_logging: bool) -> Result<Vec<TypeKey>> {
        let mut pending = std::mem::take(&mut *self.lock());
        let max_passes = pending.len().saturating_mul(pending.len()).max(1);

        for pass in 0..max_passes {
            let before = pending.len();
            let mut waiting = Vec::with_capacity(before);
            let mut queue = pending.into_iter();

            while let Some(factory) = queue.next() {
                if !factory.is_ready(registry) {
                    waiting.push(factory);
                    continue;
                }

                let output = factory.output();
                match factory.run(registry) {
                    Ok(produced) => {
                        if debug_logging {
                            debug!(ty = output.name(), name = ?produced.name, pass, "factory resolved");
                        }
                    }
                    Err(err) => {
                        error!(ty = output.name(), error = %err, "factory failed");
                        waiting.extend(queue);
                        self.restore(waiting);
                        return Err(err);
                    }
                }
            }

            pending = waiting;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        let mut unresolved: Vec<TypeKey> = pending.iter().map(PendingFactory::output).collect();
        unresolved.sort_by_key(|key| key.name());
        self.restore(pending);
        Ok(unresolved)
    }

    fn restore(&self, factories: Vec<PendingFactory>) {
        let mut pending = self.lock();
        // Factories registered while running go after the ones that were already waiting.
        let added = std::mem::replace(&mut *pending, factories);
        pending.extend(added);
    }
}
