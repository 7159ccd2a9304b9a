use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use range_blocks::{AdaptiveStrategy, GroupingStrategy, Padding, RangeTable, Report, Strategy};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "range-blocks")]
#[command(author, version, about = "Group expanded integer ranges into repeated fixed-width blocks")]
struct Cli {
    /// Range rows, e.g. "1-5x2, 10-12" (overrides --table)
    #[arg(short, long)]
    ranges: Option<RangeTable>,

    /// JSON file holding the range table to start from (the default table is used if it does not exist)
    #[arg(long, env = "RANGE_BLOCKS_TABLE")]
    table: Option<PathBuf>,

    /// Write the range table used for this run to a JSON file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Block width
    #[arg(
        short,
        long,
        default_value_t = 5,
        env = "RANGE_BLOCKS_WIDTH",
        value_parser = clap::value_parser!(u16).range(2..=10)
    )]
    width: u16,

    /// Grouping strategy: fixed or adaptive
    #[arg(short, long, default_value = "fixed")]
    strategy: Strategy,

    /// Do not pad the last block (adaptive strategy only)
    #[arg(long)]
    no_pad: bool,

    /// Print the expanded vector before the result
    #[arg(long)]
    expanded: bool,

    /// Emit JSON instead of a text table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    strategy: &'static str,
    width: usize,
    padded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    expanded: Option<Vec<i64>>,
    blocks: &'a Report,
}

/// `RUST_LOG` 未设置或无法解析时默认 `warn`
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

/// `--ranges` 优先，其次 `--table` 指向的文件；文件不存在时用默认表。
fn load_table(cli: &Cli) -> Result<RangeTable> {
    if let Some(ranges) = &cli.ranges {
        return Ok(ranges.clone());
    }
    match &cli.table {
        Some(path) if path.exists() => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid range table in {}", path.display()))
        }
        _ => Ok(RangeTable::default()),
    }
}

fn save_table(table: &RangeTable, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(table)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

fn select_strategy(cli: &Cli) -> Strategy {
    match cli.strategy {
        Strategy::Adaptive(_) if cli.no_pad => {
            Strategy::Adaptive(AdaptiveStrategy::new().with_padding(Padding::Disabled))
        }
        Strategy::Fixed(_) if cli.no_pad => {
            warn!("--no-pad has no effect with the fixed strategy");
            cli.strategy
        }
        other => other,
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let table = load_table(&cli)?;
    let strategy = select_strategy(&cli);
    let width = usize::from(cli.width);

    info!(
        rows = table.len(),
        elements = table.element_count(),
        strategy = %strategy,
        width,
        "grouping"
    );
    let grouping = strategy
        .group(&table.multiset(), width)
        .context("grouping failed")?;
    let report = grouping.report();

    if let Some(path) = &cli.save {
        save_table(&table, path)?;
    }

    let expanded = cli.expanded.then(|| table.expand());
    if cli.json {
        let output = Output {
            strategy: strategy.name(),
            width,
            padded: grouping.padded(),
            expanded,
            blocks: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(values) = expanded {
        println!("Expanded vector: {values:?}");
        println!();
    }
    println!("Grouping result (consolidated and sorted)");
    print!("{report}");
    if grouping.padded() > 0 {
        println!("({} padding value(s) added to the last block)", grouping.padded());
    }
    Ok(())
}
