use std::{collections::HashSet, fmt, str::FromStr};

use tracing::{debug, instrument};

use crate::{
    Block, Error, Multiset, Result,
    consolidate::{BlockCount, Report, consolidate},
    extract::{homogeneous_blocks, remainder_blocks, sequence_blocks},
};

/// 已经通过某个策略最小值检查的块宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Width(usize);

impl Width {
    pub fn new(width: usize, min: usize) -> Result<Self> {
        let min = min.max(1);
        if width < min {
            return Err(Error::InvalidWidth { width, min });
        }
        Ok(Width(width))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

/// 一次分组的结果。
///
/// `padded` 是补齐最后一块时额外加入的元素个数，它们总在最后一块的末尾。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grouping {
    blocks: Vec<Block>,
    padded: usize,
}

impl Grouping {
    pub fn new(blocks: Vec<Block>) -> Self {
        Grouping { blocks, padded: 0 }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn padded(&self) -> usize {
        self.padded
    }

    pub fn distinct_patterns(&self) -> usize {
        distinct_patterns(&self.blocks)
    }

    /// 除去补齐元素后的全部值，应当等于输入的多重集
    pub fn conserved(&self) -> Multiset {
        let mut values: Vec<i64> = self
            .blocks
            .iter()
            .flat_map(|b| b.values())
            .copied()
            .collect();
        values.truncate(values.len() - self.padded);
        values.into_iter().collect()
    }

    pub fn consolidate(&self) -> Vec<BlockCount> {
        consolidate(&self.blocks)
    }

    pub fn report(&self) -> Report {
        Report::new(self.consolidate())
    }
}

fn distinct_patterns(blocks: &[Block]) -> usize {
    blocks.iter().collect::<HashSet<_>>().len()
}

/// 所有分组策略的公共接口。宽度在做任何工作之前校验。
pub trait GroupingStrategy {
    fn name(&self) -> &'static str;

    fn min_width(&self) -> usize;

    /// 对已校验的宽度切块
    fn partition(&self, multiset: &Multiset, width: Width) -> Grouping;

    fn group(&self, multiset: &Multiset, width: usize) -> Result<Grouping> {
        let width = Width::new(width, self.min_width())?;
        Ok(self.partition(multiset, width))
    }
}

/// 固定顺序：同值块 -> 连续块 -> 余下切块。最后一块不补齐。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedOrderStrategy;

impl FixedOrderStrategy {
    pub const MIN_WIDTH: usize = 2;
}

impl GroupingStrategy for FixedOrderStrategy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn min_width(&self) -> usize {
        Self::MIN_WIDTH
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(width = width.get(), elements = multiset.total_len())
    )]
    fn partition(&self, multiset: &Multiset, width: Width) -> Grouping {
        let width = width.get();
        let mut rest = multiset.clone();
        let mut blocks = homogeneous_blocks(&mut rest, width);
        blocks.extend(sequence_blocks(&mut rest, width));
        blocks.extend(remainder_blocks(rest, width));
        Grouping::new(blocks)
    }
}

/// 自适应策略比较的两条路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Path {
    /// 同值块 -> 连续块
    HomogeneousFirst,
    /// 连续块 -> 同值块
    SequenceFirst,
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::HomogeneousFirst => f.write_str("homogeneous-first"),
            Path::SequenceFirst => f.write_str("sequence-first"),
        }
    }
}

/// 一条路径跑完两个提取步骤后的结果，不含余下切块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub path: Path,
    pub blocks: Vec<Block>,
    pub leftover: Multiset,
}

impl PathOutcome {
    fn run(path: Path, multiset: &Multiset, width: usize) -> Self {
        let mut leftover = multiset.clone();
        let blocks = match path {
            Path::HomogeneousFirst => {
                let mut blocks = homogeneous_blocks(&mut leftover, width);
                blocks.extend(sequence_blocks(&mut leftover, width));
                blocks
            }
            Path::SequenceFirst => {
                let mut blocks = sequence_blocks(&mut leftover, width);
                blocks.extend(homogeneous_blocks(&mut leftover, width));
                blocks
            }
        };
        PathOutcome {
            path,
            blocks,
            leftover,
        }
    }

    pub fn distinct_patterns(&self) -> usize {
        distinct_patterns(&self.blocks)
    }
}

/// 最后一块不满时怎么处理
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// 用原始输入里个数最多的值（并列取最小值）补齐。会引入输入里没有的元素。
    #[default]
    MostFrequent,
    /// 不补齐，保持严格守恒
    Disabled,
}

/// 把最后一块用 `original` 中个数最多的值补到 `width`，返回补入的元素个数。
pub fn pad_trailing_block(blocks: &mut [Block], width: usize, original: &Multiset) -> usize {
    let (Some(last), Some(value)) = (blocks.last_mut(), original.most_frequent()) else {
        return 0;
    };
    let padded = last.pad_to(width, value);
    if padded > 0 {
        debug!(value, padded, "padded trailing block");
    }
    padded
}

/// 分别跑两条路径，取不同块种类更少的一条（并列取同值块优先），再切余下元素。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveStrategy {
    padding: Padding,
}

impl AdaptiveStrategy {
    pub const MIN_WIDTH: usize = 5;

    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn with_padding(self, padding: Padding) -> Self {
        AdaptiveStrategy { padding }
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// 两条路径各自的结果，顺序为 (同值块优先, 连续块优先)
    pub fn evaluate(&self, multiset: &Multiset, width: Width) -> (PathOutcome, PathOutcome) {
        (
            PathOutcome::run(Path::HomogeneousFirst, multiset, width.get()),
            PathOutcome::run(Path::SequenceFirst, multiset, width.get()),
        )
    }

    fn choose(a: PathOutcome, b: PathOutcome) -> PathOutcome {
        if b.distinct_patterns() < a.distinct_patterns() {
            b
        } else {
            a
        }
    }
}

impl GroupingStrategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn min_width(&self) -> usize {
        Self::MIN_WIDTH
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(width = width.get(), elements = multiset.total_len())
    )]
    fn partition(&self, multiset: &Multiset, width: Width) -> Grouping {
        let (a, b) = self.evaluate(multiset, width);
        debug!(
            homogeneous_first = a.distinct_patterns(),
            sequence_first = b.distinct_patterns(),
            "compared paths"
        );
        let chosen = Self::choose(a, b);
        debug!(path = %chosen.path, "chose path");

        let PathOutcome {
            mut blocks,
            leftover,
            ..
        } = chosen;
        blocks.extend(remainder_blocks(leftover, width.get()));
        let padded = match self.padding {
            Padding::MostFrequent => pad_trailing_block(&mut blocks, width.get(), multiset),
            Padding::Disabled => 0,
        };
        Grouping { blocks, padded }
    }
}

/// 按名字选择的策略，供命令行和配置使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fixed(FixedOrderStrategy),
    Adaptive(AdaptiveStrategy),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Fixed(FixedOrderStrategy)
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Strategy::Fixed(FixedOrderStrategy)),
            "adaptive" => Ok(Strategy::Adaptive(AdaptiveStrategy::new())),
            _ => Err(Error::UnknownStrategy(s.into())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GroupingStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Fixed(s) => s.name(),
            Strategy::Adaptive(s) => s.name(),
        }
    }

    fn min_width(&self) -> usize {
        match self {
            Strategy::Fixed(s) => s.min_width(),
            Strategy::Adaptive(s) => s.min_width(),
        }
    }

    fn partition(&self, multiset: &Multiset, width: Width) -> Grouping {
        match self {
            Strategy::Fixed(s) => s.partition(multiset, width),
            Strategy::Adaptive(s) => s.partition(multiset, width),
        }
    }
}
