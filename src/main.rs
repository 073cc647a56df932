//! Dam Suitability — batch scorer entrypoint.
//! Reads newline-delimited JSON site records from a file (or stdin), scores
//! each one and writes one JSON assessment per line to stdout.
//!
//! ```text
//! dam-suitability [--mode rules|predict] [--summary] [--top N] [PATH]
//! ```

use anyhow::{bail, Context, Result};
use dam_suitability::metrics::Metrics;
use dam_suitability::{
    top_n, BatchSummary, Mode, RawAttributes, ScoringConfig, SiteAssessment, SuitabilityEngine,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_METRICS_DUMP: &str = "DAM_METRICS_DUMP";

#[derive(Debug, Default)]
struct Args {
    mode: Option<Mode>,
    summary: bool,
    top: Option<usize>,
    input: Option<PathBuf>,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--mode" => {
                let v = it.next().context("--mode needs a value")?;
                args.mode = Some(v.parse()?);
            }
            "--summary" => args.summary = true,
            "--top" => {
                let v = it.next().context("--top needs a value")?;
                args.top = Some(v.parse().with_context(|| format!("bad --top value `{v}`"))?);
            }
            "-" => args.input = None,
            s if s.starts_with("--") => bail!("unknown flag {s}"),
            path => args.input = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

/// Compact logs on stderr; `RUST_LOG` wins over the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dam_suitability=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

/// Parse NDJSON rows. Lines that are not JSON objects are logged and skipped.
fn read_rows(reader: impl BufRead) -> Result<Vec<(usize, RawAttributes)>> {
    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(RawAttributes::from_json);
        match parsed {
            Some(raw) => rows.push((line_no, raw)),
            None => warn!(line = line_no, "skipping row: not a JSON object"),
        }
    }
    Ok(rows)
}

#[derive(Serialize)]
struct OutputRow<'a> {
    line: usize,
    #[serde(flatten)]
    assessment: &'a SiteAssessment,
}

fn main() -> Result<()> {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = if std::env::var(ENV_METRICS_DUMP).is_ok_and(|v| v == "1") {
        Some(Metrics::install()?)
    } else {
        None
    };

    let args = parse_args(std::env::args().skip(1))?;
    let config = ScoringConfig::from_toml()?;
    let mode = args.mode.unwrap_or(config.scoring.default_mode);
    let engine = SuitabilityEngine::from_config(&config);

    let rows = match &args.input {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            read_rows(BufReader::new(f))?
        }
        None => read_rows(io::stdin().lock())?,
    };
    info!(
        rows = rows.len(),
        mode = mode.as_str(),
        rules = engine.rule_strategy().name(),
        "scoring batch"
    );

    let (lines, raws): (Vec<usize>, Vec<RawAttributes>) = rows.into_iter().unzip();
    let results = engine.run_batch(mode, &raws);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (line, assessment) in lines.iter().zip(&results) {
        serde_json::to_writer(&mut out, &OutputRow { line: *line, assessment })?;
        writeln!(out)?;
    }
    out.flush()?;

    if args.summary {
        let summary = BatchSummary::from_assessments(&results);
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if let Some(n) = args.top {
        for (rank, idx) in top_n(&results, n).into_iter().enumerate() {
            let r = &results[idx];
            eprintln!(
                "#{:<3} line {:<6} overall {:>5.1} ({})",
                rank + 1,
                lines[idx],
                r.overall.score,
                r.overall.category
            );
        }
    }
    if let Some(m) = metrics {
        eprintln!("{}", m.render());
    }
    Ok(())
}
