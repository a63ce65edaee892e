//! Basic usage of the segmented stack
//!
//! Run with `cargo run --example basic_usage`. Set `RUST_LOG=segstack=trace`
//! to watch blocks being allocated, reused and released.

use segstack::allocator::{SystemAllocator, TrackedAllocator};
use segstack::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> StackResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // References stay valid while the stack grows
    let mut stack = Stack::with_capacity(4);
    stack.push(String::from("bottom"))?;
    for i in 0..100 {
        stack.push(format!("item {i}"))?;
    }
    println!("{stack:?}");

    // Pops hand blocks back, keeping one spare for the next growth
    while stack.len() > 10 {
        stack.pop()?;
    }
    println!("after pops: {} elements in {} blocks", stack.len(), stack.block_count());
    stack.shrink_to_fit();
    println!("after shrink: capacity {}", stack.capacity());

    // Splicing another stack relinks its blocks instead of moving elements
    let alloc = TrackedAllocator::new(SystemAllocator::new());
    let mut left = Stack::with_config_in(StackConfig::debug(), alloc.clone())?;
    let mut right = Stack::with_config_in(StackConfig::debug(), alloc.clone())?;
    left.extend(0..20u32);
    right.extend(20..40u32);
    left.append(&mut right)?;
    println!("appended: top = {}, right empty = {}", left.top()?, right.is_empty());
    println!("{}", left.stats());

    drop(left);
    drop(right);
    println!("{}", alloc.stats());

    Ok(())
}
