/// Descriptor layout cache
///
/// Deduplicates native descriptor-set layouts by their ordered binding list.
/// Lookup hashes the list, then compares every candidate in the hash bucket
/// for full equality, so colliding signatures never alias one another.

use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use rustc_hash::{FxBuildHasher, FxHashMap};
use crate::error::{Error, Result};
use super::binding::DescriptorBinding;

/// Creates and destroys native layouts for the cache
pub trait LayoutFactory {
    type Layout: Clone;

    fn create_layout(&self, bindings: &[DescriptorBinding]) -> Result<Self::Layout>;

    fn destroy_layout(&self, layout: Self::Layout);
}

type Bucket<L> = Vec<(Vec<DescriptorBinding>, L)>;

pub struct DescriptorLayoutCache<L, S = FxBuildHasher> {
    hasher: S,
    entries: Mutex<FxHashMap<u64, Bucket<L>>>,
}

impl<L: Clone> DescriptorLayoutCache<L, FxBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }
}

impl<L: Clone> Default for DescriptorLayoutCache<L, FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Clone, S: BuildHasher> DescriptorLayoutCache<L, S> {
    /// Cache hashing signatures with `hasher`
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher, entries: Mutex::new(FxHashMap::default()) }
    }

    fn entries(&self) -> Result<MutexGuard<'_, FxHashMap<u64, Bucket<L>>>> {
        self.entries.lock()
            .map_err(|_| Error::BackendError("DescriptorLayoutCache lock poisoned".to_string()))
    }

    fn signature(&self, bindings: &[DescriptorBinding]) -> u64 {
        let mut state = self.hasher.build_hasher();
        bindings.hash(&mut state);
        state.finish()
    }

    fn find(bucket: Option<&Bucket<L>>, bindings: &[DescriptorBinding]) -> Option<L> {
        bucket?
            .iter()
            .find(|(candidate, _)| candidate.as_slice() == bindings)
            .map(|(_, layout)| layout.clone())
    }

    /// Return the cached layout for `bindings`, creating it on first request
    ///
    /// The native layout is created outside the lock. When another thread
    /// inserted an equal signature meanwhile, the fresh layout is destroyed
    /// and the cached one returned.
    pub fn make_layout<F>(&self, factory: &F, bindings: &[DescriptorBinding]) -> Result<L>
    where
        F: LayoutFactory<Layout = L>,
    {
        let signature = self.signature(bindings);

        if let Some(layout) = Self::find(self.entries()?.get(&signature), bindings) {
            return Ok(layout);
        }

        let created = factory.create_layout(bindings)?;

        let mut entries = self.entries()?;
        if let Some(existing) = Self::find(entries.get(&signature), bindings) {
            drop(entries);
            factory.destroy_layout(created);
            return Ok(existing);
        }

        entries
            .entry(signature)
            .or_default()
            .push((bindings.to_vec(), created.clone()));

        crate::engine_trace!("ember::DescriptorLayoutCache",
            "New layout with {} bindings (signature {:#018x})", bindings.len(), signature);

        Ok(created)
    }

    /// Number of distinct layouts
    pub fn len(&self) -> usize {
        self.entries()
            .map(|entries| entries.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every cached layout (shutdown only)
    pub fn destroy<F>(&self, factory: &F) -> Result<()>
    where
        F: LayoutFactory<Layout = L>,
    {
        let drained: Vec<L> = {
            let mut entries = self.entries()?;
            entries.drain().flat_map(|(_, bucket)| bucket.into_iter().map(|(_, l)| l)).collect()
        };
        for layout in drained {
            factory.destroy_layout(layout);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_cache_tests.rs"]
mod tests;
