use super::*;
use std::sync::atomic::Ordering;
use crate::descriptor::mock::MockPoolFactory;

#[test]
fn test_first_allocation_creates_pool() {
    let factory = MockPoolFactory::new(4);
    let pool = DescriptorPool::new();
    assert_eq!(pool.pool_count(), 0);

    let set = pool.allocate(&factory, &7).unwrap();
    assert_eq!(set, (0, 0));
    assert_eq!(pool.pool_count(), 1);
}

#[test]
fn test_exhaustion_creates_new_pool_and_succeeds() {
    const K: u32 = 3;
    let factory = MockPoolFactory::new(K);
    let pool = DescriptorPool::new();

    for i in 0..K {
        assert_eq!(pool.allocate(&factory, &1).unwrap(), (0, i));
    }
    assert_eq!(pool.pool_count(), 1);

    let set = pool.allocate(&factory, &1).unwrap();
    assert_eq!(set, (1, 0));
    assert_eq!(pool.pool_count(), 2);
    assert_eq!(factory.pools_created(), 2);
}

#[test]
fn test_fragmentation_also_grows() {
    let mut factory = MockPoolFactory::new(1);
    factory.fragmented = true;
    let pool = DescriptorPool::new();

    pool.allocate(&factory, &1).unwrap();
    assert_eq!(pool.allocate(&factory, &1).unwrap(), (1, 0));
}

#[test]
fn test_failure_after_retry_is_fatal() {
    let factory = MockPoolFactory::new(0);
    let pool = DescriptorPool::new();
    assert_eq!(pool.allocate(&factory, &1), Err(Error::OutOfMemory));
}

#[test]
fn test_reset_reuses_existing_pools() {
    let factory = MockPoolFactory::new(1);
    let pool = DescriptorPool::new();
    pool.allocate(&factory, &1).unwrap();
    pool.allocate(&factory, &1).unwrap();
    assert_eq!(pool.pool_count(), 2);

    pool.reset(&factory).unwrap();
    // newest pool is reused after reset
    assert_eq!(pool.allocate(&factory, &1).unwrap(), (1, 0));
    assert_eq!(pool.pool_count(), 2);
}

#[test]
fn test_destroy_releases_pools() {
    let factory = MockPoolFactory::new(1);
    let pool = DescriptorPool::new();
    pool.allocate(&factory, &1).unwrap();
    pool.allocate(&factory, &1).unwrap();

    pool.destroy(&factory).unwrap();
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 2);
    assert_eq!(pool.pool_count(), 0);
}
