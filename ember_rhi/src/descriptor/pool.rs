/// Growable descriptor pool
///
/// A list of fixed-capacity native pools. Allocation uses the newest pool;
/// when it reports exhaustion or fragmentation a new pool is created and the
/// allocation retried once. Pools are never freed before shutdown.

use std::sync::{Mutex, MutexGuard};
use crate::error::{Error, Result};

/// Why a native pool refused an allocation
#[derive(Debug, Clone, PartialEq)]
pub enum PoolError {
    OutOfPoolMemory,
    FragmentedPool,
    /// Any other failure, propagated as is
    Failed(Error),
}

/// Native pool operations
pub trait PoolFactory {
    type Pool;
    type Layout;
    type Set;

    fn create_pool(&self) -> Result<Self::Pool>;

    fn allocate_set(&self, pool: &Self::Pool, layout: &Self::Layout) -> std::result::Result<Self::Set, PoolError>;

    fn reset_pool(&self, pool: &Self::Pool) -> Result<()>;

    fn destroy_pool(&self, pool: Self::Pool);
}

pub struct DescriptorPool<P> {
    pools: Mutex<Vec<P>>,
}

impl<P> Default for DescriptorPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> DescriptorPool<P> {
    pub fn new() -> Self {
        Self { pools: Mutex::new(Vec::new()) }
    }

    fn pools(&self) -> Result<MutexGuard<'_, Vec<P>>> {
        self.pools.lock()
            .map_err(|_| Error::BackendError("DescriptorPool lock poisoned".to_string()))
    }

    /// Allocate one set for `layout`
    ///
    /// The lock is held for the whole call: native pools need external
    /// synchronization and a racing thread must not create a second pool.
    pub fn allocate<F>(&self, factory: &F, layout: &F::Layout) -> Result<F::Set>
    where
        F: PoolFactory<Pool = P>,
    {
        let mut pools = self.pools()?;

        if let Some(pool) = pools.last() {
            match factory.allocate_set(pool, layout) {
                Ok(set) => return Ok(set),
                Err(PoolError::Failed(err)) => return Err(err),
                Err(reason) => {
                    crate::engine_info!("ember::DescriptorPool",
                        "Pool {} refused allocation ({:?}), creating pool {}",
                        pools.len() - 1, reason, pools.len());
                }
            }
        }

        let pool = factory.create_pool()?;
        let result = factory.allocate_set(&pool, layout);
        pools.push(pool);

        match result {
            Ok(set) => Ok(set),
            Err(PoolError::Failed(err)) => Err(err),
            Err(reason) => {
                crate::engine_critical!("ember::DescriptorPool",
                    "Allocation failed on a fresh pool ({:?}) with {} pools", reason, pools.len());
                Err(Error::OutOfMemory)
            }
        }
    }

    /// Reset every pool, keeping them for reuse
    pub fn reset<F>(&self, factory: &F) -> Result<()>
    where
        F: PoolFactory<Pool = P>,
    {
        let pools = self.pools()?;
        for pool in pools.iter() {
            factory.reset_pool(pool)?;
        }
        Ok(())
    }

    /// Destroy every pool (shutdown only)
    pub fn destroy<F>(&self, factory: &F) -> Result<()>
    where
        F: PoolFactory<Pool = P>,
    {
        let drained: Vec<P> = self.pools()?.drain(..).collect();
        for pool in drained {
            factory.destroy_pool(pool);
        }
        Ok(())
    }

    pub fn pool_count(&self) -> usize {
        self.pools().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
