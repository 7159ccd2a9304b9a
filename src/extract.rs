//! 三个切块步骤。每一步都直接修改传入的多重集，返回本步产生的块。
use tracing::{debug, trace};

use crate::{Block, Multiset};

/// 同值块：某个值剩余个数 >= `width` 时，反复取出 `width` 个组成一块。
///
/// 按值升序处理。
pub fn homogeneous_blocks(multiset: &mut Multiset, width: usize) -> Vec<Block> {
    debug_assert!(width > 0, "width must be greater than 0");
    let mut blocks = Vec::new();
    let full: Vec<(i64, usize)> = multiset
        .iter()
        .filter(|&(_, count)| count >= width)
        .map(|(value, count)| (value, count / width))
        .collect();
    for (value, times) in full {
        multiset.remove_n(value, times * width);
        for _ in 0..times {
            trace!(value, "homogeneous block");
            blocks.push(Block::repeat(value, width));
        }
    }
    debug!(
        emitted = blocks.len(),
        remaining = multiset.total_len(),
        "homogeneous step"
    );
    blocks
}

/// 连续块：找一段 `n, n+1, ..., n+width-1` 全部还有剩余的值，各取一个。
///
/// 候选起点按剩余个数降序、值升序排列，取第一个可行的起点；每取出一块就重新排序。
/// 不同值的个数少于 `width` 时直接停止。
pub fn sequence_blocks(multiset: &mut Multiset, width: usize) -> Vec<Block> {
    debug_assert!(width > 0, "width must be greater than 0");
    let mut blocks = Vec::new();
    while multiset.distinct_len() >= width {
        let found = multiset
            .by_frequency()
            .into_iter()
            .find_map(|(start, _)| multiset.contains_run(start, width).then_some(start));
        let Some(start) = found else {
            break;
        };
        // contains_run 已经检查过，这里一定能取到
        let Some(block) = multiset.take_run(start, width) else {
            break;
        };
        trace!(start, "sequence block");
        blocks.push(block);
    }
    debug!(
        emitted = blocks.len(),
        remaining = multiset.total_len(),
        "sequence step"
    );
    blocks
}

/// 余下的元素按值升序展开，每 `width` 个切一块，最后一块可能不满。
pub fn remainder_blocks(multiset: Multiset, width: usize) -> Vec<Block> {
    debug_assert!(width > 0, "width must be greater than 0");
    let blocks: Vec<Block> = multiset
        .flatten()
        .chunks(width)
        .map(Block::from)
        .collect();
    debug!(emitted = blocks.len(), "remainder step");
    blocks
}
