use proptest::prelude::*;

use crate::{
    AdaptiveStrategy, Block, FixedOrderStrategy, GroupingStrategy, Multiset, Padding, RangeSpec,
    RangeTable, Width, extract,
};

/// 随机区间表上的性质测试：守恒、块宽、确定性、自适应路径选择。
mod grouping {
    use super::*;

    fn range_table() -> impl Strategy<Value = RangeTable> {
        proptest::collection::vec((-20i64..20, 0i64..12, 1u32..4), 0..6).prop_map(|rows| {
            rows.into_iter()
                .map(|(start, len, reps)| RangeSpec::new(start, start + len, reps).unwrap())
                .collect()
        })
    }

    fn assert_widths(blocks: &[Block], width: usize) {
        if let Some((last, full)) = blocks.split_last() {
            assert!(full.iter().all(|b| b.len() == width));
            assert!(!last.is_empty() && last.len() <= width);
        }
    }

    proptest! {
        #[test]
        fn fixed_conserves_every_value(table in range_table(), width in 2usize..=10) {
            let multiset = table.multiset();
            let grouping = FixedOrderStrategy.group(&multiset, width).unwrap();
            prop_assert_eq!(grouping.padded(), 0);
            prop_assert_eq!(grouping.conserved(), multiset);
            assert_widths(grouping.blocks(), width);
        }

        #[test]
        fn adaptive_conserves_all_but_padding(table in range_table(), width in 5usize..=10) {
            let multiset = table.multiset();
            let grouping = AdaptiveStrategy::new().group(&multiset, width).unwrap();
            prop_assert_eq!(grouping.conserved(), multiset.clone());
            prop_assert!(grouping.blocks().iter().all(|b| b.len() == width));
            let emitted: usize = grouping.blocks().iter().map(Block::len).sum();
            let extra = emitted - multiset.total_len();
            prop_assert_eq!(extra, grouping.padded());
            prop_assert!(grouping.padded() < width);
        }

        #[test]
        fn adaptive_unpadded_is_strict(table in range_table(), width in 5usize..=10) {
            let multiset = table.multiset();
            let strategy = AdaptiveStrategy::new().with_padding(Padding::Disabled);
            let grouping = strategy.group(&multiset, width).unwrap();
            prop_assert_eq!(grouping.padded(), 0);
            prop_assert_eq!(grouping.conserved(), multiset);
            assert_widths(grouping.blocks(), width);
        }

        #[test]
        fn grouping_is_deterministic(table in range_table(), width in 5usize..=8) {
            let multiset = table.multiset();
            for strategy in ["fixed", "adaptive"] {
                let strategy: crate::Strategy = strategy.parse().unwrap();
                let first = strategy.group(&multiset, width).unwrap();
                let second = strategy.group(&table.multiset(), width).unwrap();
                prop_assert_eq!(first.report(), second.report());
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn row_order_does_not_matter(table in range_table(), width in 2usize..=6) {
            let mut reversed: Vec<RangeSpec> = table.rows().to_vec();
            reversed.reverse();
            let reversed: RangeTable = reversed.into_iter().collect();
            let a = FixedOrderStrategy.group(&table.multiset(), width).unwrap();
            let b = FixedOrderStrategy.group(&reversed.multiset(), width).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn adaptive_picks_fewer_patterns(table in range_table(), width in 5usize..=8) {
            let multiset = table.multiset();
            let strategy = AdaptiveStrategy::new().with_padding(Padding::Disabled);
            let width = Width::new(width, AdaptiveStrategy::MIN_WIDTH).unwrap();
            let (a, b) = strategy.evaluate(&multiset, width);
            let grouping = strategy.partition(&multiset, width);
            let chosen = if b.distinct_patterns() < a.distinct_patterns() {
                b
            } else {
                a
            };
            prop_assert_eq!(&grouping.blocks()[..chosen.blocks.len()], chosen.blocks.as_slice());
        }

        #[test]
        fn sequence_blocks_are_runs_of_available_values(table in range_table(), width in 2usize..=6) {
            let mut multiset = table.multiset();
            let before = multiset.clone();
            let blocks = extract::sequence_blocks(&mut multiset, width);
            let mut used = Multiset::new();
            for block in &blocks {
                prop_assert!(block.is_sequence());
                prop_assert_eq!(block.len(), width);
                used.extend(block.values().iter().copied());
            }
            for (value, count) in used.iter() {
                prop_assert_eq!(before.count(value), count + multiset.count(value));
            }
        }

        #[test]
        fn consolidated_counts_sum_to_block_count(table in range_table(), width in 2usize..=6) {
            let grouping = FixedOrderStrategy.group(&table.multiset(), width).unwrap();
            let report = grouping.report();
            prop_assert_eq!(report.total_blocks(), grouping.blocks().len());
            prop_assert_eq!(report.distinct(), grouping.distinct_patterns());
            prop_assert!(report.rows().windows(2).all(|w| w[0].count >= w[1].count));
        }
    }
}
