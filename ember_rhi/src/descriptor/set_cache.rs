/// Append-only cache of allocated native descriptor sets
///
/// Sets are addressed by `DescriptorSetId`, their insertion index.

use std::sync::{Mutex, MutexGuard};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorSetId(pub u32);

pub struct DescriptorSetCache<S> {
    sets: Mutex<Vec<S>>,
}

impl<S> Default for DescriptorSetCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DescriptorSetCache<S> {
    pub fn new() -> Self {
        Self { sets: Mutex::new(Vec::new()) }
    }

    fn sets(&self) -> Result<MutexGuard<'_, Vec<S>>> {
        self.sets.lock()
            .map_err(|_| Error::BackendError("DescriptorSetCache lock poisoned".to_string()))
    }

    pub fn emplace(&self, set: S) -> Result<DescriptorSetId> {
        let mut sets = self.sets()?;
        let id = DescriptorSetId(sets.len() as u32);
        sets.push(set);
        Ok(id)
    }

    /// Run `f` on the set, failing for an unknown id
    pub fn with<R>(&self, id: DescriptorSetId, f: impl FnOnce(&S) -> R) -> Result<R> {
        let sets = self.sets()?;
        sets.get(id.0 as usize)
            .map(f)
            .ok_or_else(|| Error::InvalidResource(format!("descriptor set {} not cached", id.0)))
    }

    pub fn len(&self) -> usize {
        self.sets().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone> DescriptorSetCache<S> {
    pub fn get(&self, id: DescriptorSetId) -> Result<S> {
        self.with(id, S::clone)
    }
}

#[cfg(test)]
#[path = "set_cache_tests.rs"]
mod tests;
