//! Property tests for stack laws
//!
//! Random operation sequences are replayed against a `Vec` model; the stack
//! must agree with it after every step, whatever the block configuration.

use proptest::prelude::*;
use rstest::rstest;
use segstack::{Stack, StackConfig};

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
    Reserve(usize),
    Shrink,
    Emplace(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => (0usize..64).prop_map(Op::Reserve),
        1 => Just(Op::Shrink),
        1 => any::<i32>().prop_map(Op::Emplace),
    ]
}

fn config_strategy() -> impl Strategy<Value = StackConfig> {
    (1usize..16, 0usize..32, 1.0f64..3.0, any::<bool>()).prop_map(
        |(min, extra, factor, retain)| {
            StackConfig::new()
                .with_min_block_capacity(min)
                .with_max_block_capacity(min + extra)
                .with_growth_factor(factor)
                .with_spare_retention(retain)
        },
    )
}

fn contents(stack: &Stack<i32>) -> Vec<i32> {
    let mut copy = stack.clone();
    let mut values: Vec<i32> = std::iter::from_fn(|| copy.try_pop()).collect();
    values.reverse();
    values
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stack_matches_vec_model(
        config in config_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..200),
    ) {
        let mut stack = Stack::with_config(config).unwrap();
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    stack.push(value).unwrap();
                    model.push(value);
                }
                Op::Pop => {
                    prop_assert_eq!(stack.try_pop(), model.pop());
                }
                Op::Reserve(additional) => {
                    let allocated = stack.stats().blocks_allocated;
                    stack.reserve(additional).unwrap();
                    prop_assert!(stack.capacity() >= stack.len() + additional);

                    for i in 0..additional {
                        stack.push(i as i32).unwrap();
                    }
                    prop_assert_eq!(stack.stats().blocks_allocated, allocated);
                    for _ in 0..additional {
                        stack.pop().unwrap();
                    }
                }
                Op::Shrink => {
                    let capacity = stack.capacity();
                    stack.shrink_to_fit();
                    prop_assert!(stack.capacity() <= capacity);
                }
                Op::Emplace(value) => {
                    prop_assert_eq!(*stack.emplace_with(|| value).unwrap(), value);
                    model.push(value);
                }
            }

            prop_assert_eq!(stack.len(), model.len());
            prop_assert_eq!(stack.peek(), model.last());
        }

        prop_assert_eq!(contents(&stack), model);
    }

    #[test]
    fn pushes_then_pops_reverse_order(values in proptest::collection::vec(any::<u16>(), 0..500)) {
        let mut stack = Stack::with_block_limits(3, 17).unwrap();
        for &value in &values {
            stack.push(value).unwrap();
        }
        prop_assert_eq!(stack.len(), values.len());

        let popped: Vec<u16> = std::iter::from_fn(|| stack.try_pop()).collect();
        let expected: Vec<u16> = values.iter().rev().copied().collect();
        prop_assert_eq!(popped, expected);
    }

    #[test]
    fn reserve_prevents_allocation(len in 0usize..300, additional in 0usize..300) {
        let mut stack = Stack::with_block_limits(4, 32).unwrap();
        stack.extend(0..len as u32);
        stack.reserve(additional).unwrap();

        let allocated = stack.stats().blocks_allocated;
        prop_assert!(stack.capacity() >= len + additional);
        for i in 0..additional {
            stack.push(i as u32).unwrap();
        }
        prop_assert_eq!(stack.stats().blocks_allocated, allocated);
    }

    #[test]
    fn append_preserves_order(
        left in proptest::collection::vec(any::<i32>(), 0..200),
        right in proptest::collection::vec(any::<i32>(), 0..200),
        config in config_strategy(),
    ) {
        let mut first = Stack::with_config(config.clone()).unwrap();
        let mut second = Stack::with_config(config).unwrap();
        first.extend(left.iter().copied());
        second.extend(right.iter().copied());

        first.append(&mut second).unwrap();
        prop_assert!(second.is_empty());

        let expected: Vec<i32> = left.iter().chain(&right).copied().collect();
        prop_assert_eq!(contents(&first), expected);
    }

    #[test]
    fn shrink_keeps_contents(values in proptest::collection::vec(any::<i32>(), 1..300), pops in 0usize..300) {
        let mut stack: Stack<i32> = values.iter().copied().collect();
        for _ in 0..pops.min(values.len()) {
            stack.pop().unwrap();
        }
        let before = contents(&stack);
        let capacity = stack.capacity();

        stack.shrink_to_fit();
        prop_assert!(stack.capacity() <= capacity);
        prop_assert_eq!(contents(&stack), before);
    }
}

#[rstest]
#[case::defaults(StackConfig::default())]
#[case::production(StackConfig::production())]
#[case::memory_saving(StackConfig::memory_saving())]
#[case::debug(StackConfig::debug())]
#[case::unit_blocks(StackConfig::new().with_min_block_capacity(1).with_max_block_capacity(1))]
fn lifo_under_every_preset(#[case] config: StackConfig) {
    let mut stack = Stack::with_config(config).unwrap();
    for i in 0..5_000u32 {
        stack.push(i).unwrap();
    }

    let copy = stack.clone();
    assert_eq!(copy, stack);

    for expected in (0..5_000u32).rev() {
        assert_eq!(stack.pop().unwrap(), expected);
    }
    assert!(stack.is_empty());
    assert!(stack.block_count() <= 2);
}

#[rstest]
#[case(0, 10)]
#[case(20, 10)]
#[case(10, 0)]
fn rejects_invalid_block_limits(#[case] min: usize, #[case] max: usize) {
    let err = Stack::<u8>::with_block_limits(min, max).unwrap_err();
    assert_eq!(err.code(), "STACK:CONFIG:INVALID");
}

#[rstest]
#[case(true, 2)]
#[case(false, 1)]
fn spare_retention(#[case] retain: bool, #[case] blocks_after_pop: usize) {
    let config = StackConfig::new()
        .with_min_block_capacity(8)
        .with_max_block_capacity(8)
        .with_spare_retention(retain);
    let mut stack = Stack::with_config(config).unwrap();
    stack.extend(0..9u8);

    stack.pop().unwrap();
    assert_eq!(stack.block_count(), blocks_after_pop);
}
