//! Mock descriptor factories for unit tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use crate::error::{Error, Result};
use super::binding::DescriptorBinding;
use super::layout_cache::LayoutFactory;
use super::pool::{PoolError, PoolFactory};

/// Hands out increasing layout handles and counts destructions
#[derive(Default)]
pub(crate) struct MockLayoutFactory {
    pub created: AtomicU32,
    pub destroyed: AtomicU32,
}

impl LayoutFactory for MockLayoutFactory {
    type Layout = u32;

    fn create_layout(&self, bindings: &[DescriptorBinding]) -> Result<u32> {
        if bindings.is_empty() {
            return Err(Error::InvalidResource("empty layout".to_string()));
        }
        Ok(self.created.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn destroy_layout(&self, _layout: u32) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Pools holding exactly `capacity` sets each
pub(crate) struct MockPoolFactory {
    pub capacity: u32,
    /// Sets allocated per pool
    pub used: Mutex<Vec<u32>>,
    pub destroyed: AtomicU32,
    /// Report fragmentation instead of exhaustion
    pub fragmented: bool,
}

impl MockPoolFactory {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            used: Mutex::new(Vec::new()),
            destroyed: AtomicU32::new(0),
            fragmented: false,
        }
    }

    pub fn pools_created(&self) -> usize {
        self.used.lock().unwrap().len()
    }
}

impl PoolFactory for MockPoolFactory {
    type Pool = usize;
    type Layout = u32;
    type Set = (usize, u32);

    fn create_pool(&self) -> Result<usize> {
        let mut used = self.used.lock().unwrap();
        used.push(0);
        Ok(used.len() - 1)
    }

    fn allocate_set(&self, pool: &usize, _layout: &u32) -> std::result::Result<(usize, u32), PoolError> {
        let mut used = self.used.lock().unwrap();
        let count = &mut used[*pool];
        if *count >= self.capacity {
            return Err(if self.fragmented { PoolError::FragmentedPool } else { PoolError::OutOfPoolMemory });
        }
        *count += 1;
        Ok((*pool, *count - 1))
    }

    fn reset_pool(&self, pool: &usize) -> Result<()> {
        self.used.lock().unwrap()[*pool] = 0;
        Ok(())
    }

    fn destroy_pool(&self, _pool: usize) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}
