use std::{collections::BTreeMap, fmt};

use crate::Block;

/// 值 -> 剩余个数。计数为 0 的值不会留在表里。
///
/// 底层是 `BTreeMap`，所以所有遍历都按值升序，结果是确定的。
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Multiset(BTreeMap<i64, usize>);

impl fmt::Debug for Multiset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl Multiset {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn insert(&mut self, value: i64) {
        self.insert_n(value, 1);
    }

    pub fn insert_n(&mut self, value: i64, n: usize) {
        if n == 0 {
            return;
        }
        *self.0.entry(value).or_default() += n;
    }

    #[inline]
    pub fn count(&self, value: i64) -> usize {
        self.0.get(&value).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.0.contains_key(&value)
    }

    /// 只有剩余个数足够时才扣减，否则什么都不做并返回 `false`。
    pub fn remove_n(&mut self, value: i64, n: usize) -> bool {
        let Some(count) = self.0.get_mut(&value) else {
            return n == 0;
        };
        if *count < n {
            return false;
        }
        *count -= n;
        if *count == 0 {
            self.0.remove(&value);
        }
        true
    }

    #[inline]
    pub fn remove_one(&mut self, value: i64) -> bool {
        self.remove_n(value, 1)
    }

    /// 不同值的个数
    #[inline]
    pub fn distinct_len(&self) -> usize {
        self.0.len()
    }

    /// 元素总数（含重复）
    pub fn total_len(&self) -> usize {
        self.0.values().sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按值升序
    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.0.iter().map(|(&value, &count)| (value, count))
    }

    /// 按值升序展开，每个值重复其个数次
    pub fn flatten(&self) -> Vec<i64> {
        let mut values = Vec::with_capacity(self.total_len());
        for (&value, &count) in &self.0 {
            values.extend(std::iter::repeat_n(value, count));
        }
        values
    }

    /// 个数最多的值；并列时取最小的值
    pub fn most_frequent(&self) -> Option<i64> {
        self.0
            .iter()
            .max_by(|(lv, lc), (rv, rc)| lc.cmp(rc).then(rv.cmp(lv)))
            .map(|(&value, _)| value)
    }

    /// 排序：个数降序，个数相同则值升序
    pub fn by_frequency(&self) -> Vec<(i64, usize)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|(lv, lc), (rv, rc)| rc.cmp(lc).then(lv.cmp(rv)));
        ranked
    }

    /// `start..start+width` 是否每个值都还至少剩一个
    pub fn contains_run(&self, start: i64, width: usize) -> bool {
        (0..width as u64).all(|i| {
            start
                .checked_add_unsigned(i)
                .is_some_and(|value| self.contains(value))
        })
    }

    /// 检查并取走一段连续值，各扣一个。任何一个缺失则不改动集合。
    pub fn take_run(&mut self, start: i64, width: usize) -> Option<Block> {
        if !self.contains_run(start, width) {
            return None;
        }
        let block = Block::run(start, width)?;
        for &value in block.values() {
            self.remove_one(value);
        }
        Some(block)
    }
}

impl FromIterator<i64> for Multiset {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut multiset = Multiset::new();
        multiset.extend(iter);
        multiset
    }
}

impl Extend<i64> for Multiset {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
