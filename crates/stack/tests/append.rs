//! Append (splice) tests
//!
//! Every strategy `append` can pick must produce the same element order:
//! relinking, element-wise moves into free slots, adopting the whole chain,
//! and copying between stacks whose allocators differ.

use pretty_assertions::assert_eq;
use segstack::allocator::{SystemAllocator, TrackedAllocator};
use segstack::{Stack, StackConfig};

fn drain<T, A: segstack::allocator::Allocator>(stack: &mut Stack<T, A>) -> Vec<T> {
    std::iter::from_fn(|| stack.try_pop()).collect()
}

#[test]
fn test_small_append_sum() {
    let mut first = Stack::new();
    let mut second = Stack::new();
    for number in 0..20 {
        first.push(number).unwrap();
        second.push(number + 20).unwrap();
    }

    first.append(&mut second).unwrap();
    assert!(second.is_empty());

    let total: i32 = drain(&mut first).into_iter().sum();
    assert_eq!(total, 780);
}

#[test]
fn test_large_append_wrapping_sum() {
    let mut first = Stack::new();
    let mut second = Stack::new();
    for number in 0..100_000u32 {
        first.push(number).unwrap();
        second.push(number + 100_000).unwrap();
    }

    first.append(&mut second).unwrap();
    assert_eq!(first.len(), 200_000);
    assert_eq!(first.stats().relinked_appends, 1);

    let total = drain(&mut first)
        .into_iter()
        .fold(0u32, u32::wrapping_add);
    assert_eq!(total, 2_820_030_816);
}

#[test]
fn test_unequal_size_append() {
    let mut first: Stack<u32> = (150..250).collect();
    let mut second: Stack<u32> = (0..150).collect();

    first.append(&mut second).unwrap();

    let popped = drain(&mut first);
    assert_eq!(popped.iter().sum::<u32>(), 31_125);

    let expected: Vec<u32> = (150..250).chain(0..150).rev().collect();
    assert_eq!(popped, expected);
}

#[test]
fn test_append_into_free_slots_moves_elements() {
    let mut first = Stack::with_block_limits(64, 64).unwrap();
    first.extend(0..10u32);
    let mut second: Stack<u32> = (10..20).collect();

    first.append(&mut second).unwrap();
    assert_eq!(first.block_count(), 1);
    assert_eq!(first.stats().relinked_appends, 0);
    assert_eq!(second.block_count(), 0);
    assert_eq!(drain(&mut first), (0..20).rev().collect::<Vec<_>>());
}

#[test]
fn test_append_into_empty_adopts_chain() {
    let mut first: Stack<u32> = Stack::with_block_limits(4, 4).unwrap();
    first.reserve(2).unwrap();
    let mut second = Stack::with_block_limits(4, 4).unwrap();
    second.extend(0..30u32);
    let blocks = second.block_count();

    first.append(&mut second).unwrap();
    assert_eq!(first.block_count(), blocks);
    assert_eq!(first.len(), 30);
    assert_eq!(second.block_count(), 0);
    assert_eq!(drain(&mut first), (0..30).rev().collect::<Vec<_>>());
}

#[test]
fn test_append_empty_source_is_noop() {
    let mut first: Stack<u32> = (0..5).collect();
    let mut second = Stack::new();
    first.append(&mut second).unwrap();
    assert_eq!(first.len(), 5);
}

#[test]
fn test_relinked_partial_block_is_refilled() {
    let mut first = Stack::with_block_limits(4, 4).unwrap();
    let mut second = Stack::with_block_limits(4, 4).unwrap();
    first.extend(0..6u32);
    second.extend(100..110u32);

    first.append(&mut second).unwrap();
    assert_eq!(first.stats().relinked_appends, 1);

    for _ in 0..10 {
        first.pop().unwrap();
    }
    assert_eq!(first.top().unwrap(), &5);

    // the block holding 4 and 5 still has two free slots
    first.push(6).unwrap();
    first.push(7).unwrap();
    let allocated = first.stats().blocks_allocated;
    assert_eq!(drain(&mut first), (0..8).rev().collect::<Vec<_>>());
    assert_eq!(first.stats().blocks_allocated, allocated);
}

#[test]
fn test_relink_keeps_reserved_capacity() {
    let mut first = Stack::with_block_limits(4, 4).unwrap();
    first.extend(0..6u32);
    first.reserve(20).unwrap();
    let reserved = first.capacity();

    let mut second = Stack::with_block_limits(4, 4).unwrap();
    second.extend(6..16u32);
    let incoming = second.capacity();

    first.append(&mut second).unwrap();
    assert_eq!(first.capacity(), reserved + incoming);
    assert_eq!(drain(&mut first), (0..16).rev().collect::<Vec<_>>());
}

#[test]
fn test_append_across_allocators_does_not_leak() {
    let left_alloc = TrackedAllocator::new(SystemAllocator::new());
    let right_alloc = TrackedAllocator::new(SystemAllocator::new());

    {
        let mut left = Stack::with_config_in(StackConfig::debug(), left_alloc.clone()).unwrap();
        let mut right =
            Stack::with_config_in(StackConfig::debug(), right_alloc.clone()).unwrap();
        left.extend((0..50).map(|i| i.to_string()));
        right.extend((50..120).map(|i| i.to_string()));

        left.append(&mut right).unwrap();
        assert!(!right_alloc.has_leaks());
        assert_eq!(left.len(), 120);
        assert_eq!(left.top().unwrap(), "119");
    }

    assert!(!left_alloc.has_leaks());
    assert!(!right_alloc.has_leaks());
}

#[test]
fn test_append_shared_tracker_relinks() {
    let alloc = TrackedAllocator::new(SystemAllocator::new());

    {
        let mut left = Stack::with_config_in(StackConfig::debug(), alloc.clone()).unwrap();
        let mut right = Stack::with_config_in(StackConfig::debug(), alloc.clone()).unwrap();
        left.extend(0..40u64);
        right.extend(40..90u64);

        left.append(&mut right).unwrap();
        assert_eq!(left.stats().relinked_appends, 1);
        assert_eq!(drain(&mut left), (0..90).rev().collect::<Vec<_>>());
    }

    assert!(!alloc.has_leaks());
}
