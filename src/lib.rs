//! 把若干闭区间展开成整数多重集，再按固定宽度贪心切分成尽量多重复的块。
//!
//! 流程：`RangeTable` 展开为 [`Multiset`]，交给某个 [`GroupingStrategy`]
//! 切块，最后用 [`consolidate`] 统计每种块出现的次数。
use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod consolidate;
pub mod extract;
pub mod multiset;
pub mod strategy;

#[cfg(test)]
mod prop_tests;

pub use consolidate::{BlockCount, Report, consolidate};
pub use multiset::Multiset;
pub use strategy::{
    AdaptiveStrategy, FixedOrderStrategy, Grouping, GroupingStrategy, Padding, Path, PathOutcome,
    Strategy, Width, pad_trailing_block,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid range {start}-{end}: start is greater than end")]
    InvalidRange { start: i64, end: i64 },
    #[error("invalid range {start}-{end}: repetitions must be at least 1")]
    InvalidRepetitions { start: i64, end: i64 },
    #[error("width {width} is below the minimum of {min}")]
    InvalidWidth { width: usize, min: usize },
    #[error("malformed range row {row}: {input:?}")]
    Syntax { row: usize, input: Box<str> },
    #[error("unknown grouping strategy {0:?}")]
    UnknownStrategy(Box<str>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// inclusive，整段重复 `repetitions` 次
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRangeSpec")]
pub struct RangeSpec {
    start: i64,
    end: i64,
    repetitions: u32,
}

#[derive(Deserialize)]
struct RawRangeSpec {
    start: i64,
    end: i64,
    #[serde(default = "one")]
    repetitions: u32,
}

fn one() -> u32 {
    1
}

impl TryFrom<RawRangeSpec> for RangeSpec {
    type Error = Error;

    fn try_from(raw: RawRangeSpec) -> Result<Self> {
        RangeSpec::new(raw.start, raw.end, raw.repetitions)
    }
}

impl RangeSpec {
    pub fn new(start: i64, end: i64, repetitions: u32) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        if repetitions == 0 {
            return Err(Error::InvalidRepetitions { start, end });
        }
        Ok(RangeSpec {
            start,
            end,
            repetitions,
        })
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    #[inline]
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// 单次重复包含的值个数
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start).saturating_add(1)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// 展开后的元素总数，即 `len() * repetitions()`
    #[inline]
    pub fn element_count(&self) -> u64 {
        self.len().saturating_mul(u64::from(self.repetitions))
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.start <= value && value <= self.end
    }

    /// 单次重复的值，升序
    #[inline]
    pub fn iter(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }
}

impl TryFrom<(i64, i64, u32)> for RangeSpec {
    type Error = Error;

    #[inline]
    fn try_from((start, end, repetitions): (i64, i64, u32)) -> Result<Self> {
        RangeSpec::new(start, end, repetitions)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)?;
        if self.repetitions != 1 {
            write!(f, "x{}", self.repetitions)?;
        }
        Ok(())
    }
}

/// 调用方持有的区间表，每一行一个 [`RangeSpec`]。
///
/// 行的顺序只影响 [`RangeTable::expand`] 的输出顺序，不影响分组结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeTable(Vec<RangeSpec>);

impl Default for RangeTable {
    /// 初始表只有一行 `1-5x2`
    fn default() -> Self {
        RangeTable(vec![RangeSpec {
            start: 1,
            end: 5,
            repetitions: 2,
        }])
    }
}

impl RangeTable {
    pub fn new() -> Self {
        RangeTable(Vec::new())
    }

    pub fn push(&mut self, row: RangeSpec) {
        self.0.push(row);
    }

    pub fn remove(&mut self, index: usize) -> Option<RangeSpec> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn rows(&self) -> &[RangeSpec] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn element_count(&self) -> u64 {
        self.0.iter().map(RangeSpec::element_count).sum()
    }

    /// 按行顺序展开：每行重复 `repetitions` 次，每次从 start 到 end 升序。
    pub fn expand(&self) -> Vec<i64> {
        let mut values = Vec::new();
        for row in &self.0 {
            for _ in 0..row.repetitions {
                values.extend(row.iter());
            }
        }
        values
    }

    /// 直接累加计数，不先展开成向量
    pub fn multiset(&self) -> Multiset {
        let mut multiset = Multiset::new();
        for row in &self.0 {
            for value in row.iter() {
                multiset.insert_n(value, row.repetitions as usize);
            }
        }
        multiset
    }

    /// 解析 `1-5x2, 10-12, -3--1, 7` 形式的文本。
    ///
    /// 每行 `start-end`，可选 `xN` 表示重复次数（默认 1），单个数字 `7` 等价于 `7-7`。
    /// 空行被忽略。
    pub fn parse(input: &str) -> Result<RangeTable> {
        let mut table = RangeTable::new();
        let rows = input.split(',').map(str::trim).filter(|s| !s.is_empty());
        for (row, text) in rows.enumerate() {
            let syntax = || Error::Syntax {
                row,
                input: text.into(),
            };
            let (bounds, repetitions) = match text.rsplit_once(|c: char| c == 'x' || c == 'X') {
                Some((bounds, reps)) => (
                    bounds.trim_end(),
                    reps.trim().parse::<u32>().map_err(|_| syntax())?,
                ),
                None => (text, 1),
            };
            let (start, end) = match split_bounds(bounds) {
                Some((start, end)) => (start.trim(), end.trim()),
                None => (bounds, bounds),
            };
            let start = start.parse::<i64>().map_err(|_| syntax())?;
            let end = end.parse::<i64>().map_err(|_| syntax())?;
            table.push(RangeSpec::new(start, end, repetitions)?);
        }
        Ok(table)
    }
}

/// 找到分隔 start 和 end 的 `-`：它前面必须是数字，这样负号不会被误认。
fn split_bounds(bounds: &str) -> Option<(&str, &str)> {
    let bytes = bounds.as_bytes();
    let idx = (1..bytes.len()).find(|&i| {
        bytes[i] == b'-' && bounds[..i].trim_end().ends_with(|c: char| c.is_ascii_digit())
    })?;
    Some((&bounds[..idx], &bounds[idx + 1..]))
}

impl FromStr for RangeTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RangeTable::parse(s)
    }
}

impl fmt::Display for RangeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

impl FromIterator<RangeSpec> for RangeTable {
    fn from_iter<I: IntoIterator<Item = RangeSpec>>(iter: I) -> Self {
        RangeTable(iter.into_iter().collect())
    }
}

/// 一个输出块：有序的整数序列，通常长度等于宽度。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Block(Vec<i64>);

impl Block {
    pub fn new(values: Vec<i64>) -> Self {
        Block(values)
    }

    /// `width` 个相同的值
    pub fn repeat(value: i64, width: usize) -> Self {
        Block(vec![value; width])
    }

    /// `start, start+1, ..., start+width-1`，溢出时返回 `None`
    pub fn run(start: i64, width: usize) -> Option<Self> {
        (0..width as u64)
            .map(|i| start.checked_add_unsigned(i))
            .collect::<Option<Vec<_>>>()
            .map(Block)
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    pub fn into_values(self) -> Vec<i64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_homogeneous(&self) -> bool {
        self.0.windows(2).all(|w| w[0] == w[1])
    }

    pub fn is_sequence(&self) -> bool {
        self.0.windows(2).all(|w| w[0].checked_add(1) == Some(w[1]))
    }

    /// 用 `value` 补齐到 `width`，返回补了几个
    pub fn pad_to(&mut self, width: usize, value: i64) -> usize {
        let missing = width.saturating_sub(self.0.len());
        self.0.resize(self.0.len() + missing, value);
        missing
    }
}

impl From<Vec<i64>> for Block {
    fn from(values: Vec<i64>) -> Self {
        Block(values)
    }
}

impl From<&[i64]> for Block {
    fn from(values: &[i64]) -> Self {
        Block(values.to_vec())
    }
}

impl AsRef<[i64]> for Block {
    fn as_ref(&self) -> &[i64] {
        &self.0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for value in &self.0 {
            list.entry(value);
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Block, Error, RangeSpec, RangeTable};

    fn table(rows: &[(i64, i64, u32)]) -> RangeTable {
        rows.iter()
            .map(|&row| RangeSpec::try_from(row).unwrap())
            .collect()
    }

    #[test]
    fn test_range_spec_rejects_reversed_bounds() {
        assert_eq!(
            RangeSpec::new(5, 1, 1),
            Err(Error::InvalidRange { start: 5, end: 1 })
        );
    }

    #[test]
    fn test_range_spec_rejects_zero_repetitions() {
        assert_eq!(
            RangeSpec::new(1, 5, 0),
            Err(Error::InvalidRepetitions { start: 1, end: 5 })
        );
    }

    #[test]
    fn test_range_spec_counts() {
        let row = RangeSpec::new(-2, 2, 3).unwrap();
        assert_eq!(row.len(), 5);
        assert_eq!(row.element_count(), 15);
        assert!(row.contains(-2));
        assert!(!row.contains(3));
        assert_eq!(RangeSpec::new(i64::MIN, i64::MAX, 1).unwrap().len(), u64::MAX);
    }

    #[test]
    fn test_expand_repeats_each_row_in_order() {
        let t = table(&[(1, 3, 2), (7, 7, 1)]);
        assert_eq!(t.expand(), vec![1, 2, 3, 1, 2, 3, 7]);
        assert_eq!(t.element_count(), 7);
    }

    #[test]
    fn test_expand_empty_table() {
        assert!(RangeTable::new().expand().is_empty());
        assert!(RangeTable::new().multiset().is_empty());
    }

    #[test]
    fn test_multiset_matches_expanded_vector() {
        let t = table(&[(1, 5, 2), (3, 8, 1), (-1, 1, 4)]);
        let from_vec: crate::Multiset = t.expand().into_iter().collect();
        assert_eq!(t.multiset(), from_vec);
    }

    #[test]
    fn test_default_table() {
        assert_eq!(RangeTable::default(), table(&[(1, 5, 2)]));
    }

    #[test]
    fn test_remove_row() {
        let mut t = table(&[(1, 2, 1), (3, 4, 1)]);
        assert_eq!(t.remove(0), Some(RangeSpec::new(1, 2, 1).unwrap()));
        assert_eq!(t.remove(5), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_parse_notation() {
        let t = RangeTable::parse("1-5x2, 10-12 ,7, -3--1 x 2").unwrap();
        assert_eq!(t, table(&[(1, 5, 2), (10, 12, 1), (7, 7, 1), (-3, -1, 2)]));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(RangeTable::parse("").unwrap().is_empty());
        assert!(RangeTable::parse(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_negative_single_and_mixed() {
        let t = RangeTable::parse("-4, -2-3").unwrap();
        assert_eq!(t, table(&[(-4, -4, 1), (-2, 3, 1)]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            RangeTable::parse("1-5, a-3"),
            Err(Error::Syntax {
                row: 1,
                input: "a-3".into()
            })
        );
        assert!(matches!(
            RangeTable::parse("1-5xq"),
            Err(Error::Syntax { row: 0, .. })
        ));
    }

    #[test]
    fn test_parse_propagates_validation() {
        assert_eq!(
            RangeTable::parse("9-3"),
            Err(Error::InvalidRange { start: 9, end: 3 })
        );
        assert_eq!(
            RangeTable::parse("1-3x0"),
            Err(Error::InvalidRepetitions { start: 1, end: 3 })
        );
    }

    #[test]
    fn test_display_is_parseable() {
        let t = table(&[(1, 5, 2), (-3, -1, 1)]);
        assert_eq!(t.to_string(), "1-5x2,-3--1");
        assert_eq!(t.to_string().parse::<RangeTable>().unwrap(), t);
    }

    #[test]
    fn test_json_session_format() {
        let t = table(&[(1, 5, 2)]);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"[{"start":1,"end":5,"repetitions":2}]"#);
        let back: RangeTable = serde_json::from_str(r#"[{"start":1,"end":5,"repetitions":2},{"start":4,"end":6}]"#).unwrap();
        assert_eq!(back, table(&[(1, 5, 2), (4, 6, 1)]));
    }

    #[test]
    fn test_json_rejects_invalid_rows() {
        assert!(serde_json::from_str::<RangeTable>(r#"[{"start":6,"end":1}]"#).is_err());
        assert!(
            serde_json::from_str::<RangeTable>(r#"[{"start":1,"end":2,"repetitions":0}]"#)
                .is_err()
        );
    }

    #[test]
    fn test_block_shapes() {
        assert_eq!(Block::repeat(4, 3).values(), &[4, 4, 4]);
        assert_eq!(Block::run(8, 3).unwrap().values(), &[8, 9, 10]);
        assert!(Block::run(i64::MAX - 1, 3).is_none());
        assert!(Block::repeat(4, 3).is_homogeneous());
        assert!(Block::run(-1, 4).unwrap().is_sequence());
        assert!(!Block::new(vec![1, 3]).is_sequence());
    }

    #[test]
    fn test_block_pad_to() {
        let mut block = Block::new(vec![1, 2, 3]);
        assert_eq!(block.pad_to(5, 1), 2);
        assert_eq!(block.values(), &[1, 2, 3, 1, 1]);
        assert_eq!(block.pad_to(5, 9), 0);
        assert_eq!(block.to_string(), "[1, 2, 3, 1, 1]");
    }
}
