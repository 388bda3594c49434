//! Reusable-instance pools keyed by template.
//!
//! The pool exclusively owns inactive instances. [`ObjectPool::acquire`] moves
//! an instance out to the caller, who owns it until handing it back through
//! [`ObjectPool::release`]. Every template gets its own free list so instances
//! built from different stat sheets never mix.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
};

use thiserror::Error;
use tracing::{debug, error, warn};

/// Instance that can be recycled through an [`ObjectPool`].
pub trait Pooled {
    /// Identity that stays stable across reuse.
    type Id: Copy + Eq + Hash + Debug;
    /// Key of the sub-pool the instance belongs to.
    type Template: Copy + Eq + Hash + Debug;

    /// Identity of the instance.
    fn id(&self) -> Self::Id;

    /// Template the instance was built from, if it is still known.
    fn template(&self) -> Option<Self::Template>;

    /// Clears transient state before the instance goes back on a free list.
    fn reset(&mut self);
}

/// Construction and destruction primitives used by a pool.
pub trait Factory<T: Pooled> {
    /// Builds a new instance from the template, or `None` if the template is
    /// unknown to the factory.
    fn instantiate(&mut self, template: T::Template) -> Option<T>;

    /// Disposes of an instance the pool refuses to keep.
    fn destroy(&mut self, _instance: T) {}
}

/// Failures reported while building pooled instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError<K: Debug> {
    /// The factory does not know how to build the template.
    #[error("no factory recipe for template {0:?}")]
    UnknownTemplate(K),
}

/// Outcome of handing an instance back to a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// The instance was reset and queued for reuse.
    Pooled,
    /// The instance was already on a free list and was ignored.
    AlreadyPooled,
    /// The instance carried no template and was destroyed.
    Destroyed,
}

/// Pool of reusable instances partitioned into per-template free lists.
#[derive(Debug)]
pub struct ObjectPool<T: Pooled, F> {
    label: &'static str,
    factory: F,
    free: HashMap<T::Template, VecDeque<T>>,
    pooled: HashSet<T::Id>,
    active: HashSet<T::Id>,
    grown: u32,
}

impl<T: Pooled, F: Factory<T>> ObjectPool<T, F> {
    /// Creates an empty pool that builds instances with the provided factory.
    #[must_use]
    pub fn new(label: &'static str, factory: F) -> Self {
        Self {
            label,
            factory,
            free: HashMap::new(),
            pooled: HashSet::new(),
            active: HashSet::new(),
            grown: 0,
        }
    }

    /// Takes an instance for the template, building one when the free list is
    /// empty.
    pub fn acquire(&mut self, template: T::Template) -> Result<T, PoolError<T::Template>> {
        let reused = self
            .free
            .get_mut(&template)
            .and_then(|queue| queue.pop_front());

        let instance = match reused {
            Some(instance) => {
                let _ = self.pooled.remove(&instance.id());
                instance
            }
            None => {
                let instance = self
                    .factory
                    .instantiate(template)
                    .ok_or(PoolError::UnknownTemplate(template))?;
                self.grown = self.grown.saturating_add(1);
                warn!(
                    pool = self.label,
                    ?template,
                    "pool empty, constructed a new instance; consider a larger preload"
                );
                instance
            }
        };

        let _ = self.active.insert(instance.id());
        Ok(instance)
    }

    /// Hands an instance back to the pool.
    pub fn release(&mut self, mut instance: T) -> Release {
        let id = instance.id();
        if self.pooled.contains(&id) {
            debug!(pool = self.label, ?id, "ignored release of an already pooled instance");
            return Release::AlreadyPooled;
        }
        let _ = self.active.remove(&id);

        let Some(template) = instance.template() else {
            error!(pool = self.label, ?id, "released instance has no template, destroying it");
            self.factory.destroy(instance);
            return Release::Destroyed;
        };

        instance.reset();
        let _ = self.pooled.insert(id);
        self.free.entry(template).or_default().push_back(instance);
        Release::Pooled
    }

    /// Tops the template's free list up to `count` idle instances, returning
    /// how many were constructed.
    pub fn preload(
        &mut self,
        template: T::Template,
        count: u32,
    ) -> Result<u32, PoolError<T::Template>> {
        let mut constructed = 0;
        while self.available(template) < count as usize {
            let mut instance = self
                .factory
                .instantiate(template)
                .ok_or(PoolError::UnknownTemplate(template))?;
            instance.reset();
            let _ = self.pooled.insert(instance.id());
            self.free.entry(template).or_default().push_back(instance);
            constructed += 1;
        }
        Ok(constructed)
    }

    /// Number of idle instances waiting for the template.
    #[must_use]
    pub fn available(&self, template: T::Template) -> usize {
        self.free.get(&template).map_or(0, VecDeque::len)
    }

    /// Number of instances currently handed out.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.len()
    }

    /// Number of instances built on demand because a free list ran dry.
    #[must_use]
    pub const fn grown(&self) -> u32 {
        self.grown
    }

    /// Destroys every idle instance.
    pub fn clear(&mut self) {
        for (_, queue) in self.free.drain() {
            for instance in queue {
                self.factory.destroy(instance);
            }
        }
        self.pooled.clear();
    }
}
