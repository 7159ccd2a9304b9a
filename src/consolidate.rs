use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::Block;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockCount {
    pub block: Block,
    pub count: usize,
}

/// 相同（按顺序逐个相等）的块合并计数，按次数降序。
///
/// 次数相同的块保持它们在 `blocks` 中第一次出现的先后顺序。
pub fn consolidate(blocks: &[Block]) -> Vec<BlockCount> {
    let mut index: HashMap<&Block, usize> = HashMap::with_capacity(blocks.len());
    let mut counts: Vec<BlockCount> = Vec::new();
    for block in blocks {
        match index.get(block) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(block, counts.len());
                counts.push(BlockCount {
                    block: block.clone(),
                    count: 1,
                });
            }
        }
    }
    // sort_by 是稳定排序
    counts.sort_by(|l, r| r.count.cmp(&l.count));
    counts
}

/// 合并后的结果表
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Report(Vec<BlockCount>);

impl Report {
    pub fn new(rows: Vec<BlockCount>) -> Self {
        Report(rows)
    }

    pub fn rows(&self) -> &[BlockCount] {
        &self.0
    }

    /// 不同块的种类数
    pub fn distinct(&self) -> usize {
        self.0.len()
    }

    pub fn total_blocks(&self) -> usize {
        self.0.iter().map(|row| row.count).sum()
    }
}

impl From<&[Block]> for Report {
    fn from(blocks: &[Block]) -> Self {
        Report(consolidate(blocks))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.0.iter().map(|row| row.block.to_string()).collect();
        let width = cells
            .iter()
            .map(String::len)
            .chain(std::iter::once("Block".len()))
            .max()
            .unwrap_or(0);
        writeln!(f, "{:<width$}  Repetitions", "Block")?;
        for (cell, row) in cells.iter().zip(&self.0) {
            writeln!(f, "{cell:<width$}  {}", row.count)?;
        }
        Ok(())
    }
}
