//! peer-runner: headless anchor-vs-peers report.
//!
//! Usage:
//!   peer-runner --metrics grad_long.csv --headcounts headcounts.csv --year 2023 --anchor 110635
//!   peer-runner --mock 500 --seed 42 --year 2023 --anchor 100003 --winsorize --robust --json
//!   peer-runner --metrics grad_long.csv --db canonical.db --import
//!   peer-runner --db canonical.db --year 2023 --anchor 110635 --threshold "More than 5,000 full-time undergrads"

use anyhow::{bail, Result};
use peergroup_core::{
    anchor::{AnchorQuery, AnchorReport},
    config::PeerConfig,
    engine::PeerEngine,
    frame::PeerInputs,
    loader,
    mock::MockDataset,
    outputs,
    store::PeerStore,
    table::{FallbackHeadcounts, HeadcountTable, MetricTable},
    threshold::ALL_INSTITUTIONS,
    types::{InstitutionId, Year},
};
use std::env;
use std::path::Path;

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    report: &'a AnchorReport,
}

struct Tables {
    metrics:    MetricTable,
    headcounts: Option<HeadcountTable>,
    fallback:   Option<FallbackHeadcounts>,
    source:     String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = has_flag(&args, "--json");
    let robust = has_flag(&args, "--robust");
    let winsorize = has_flag(&args, "--winsorize");
    let import = has_flag(&args, "--import");
    let summary_only = has_flag(&args, "--summary");
    let threshold = arg_value(&args, "--threshold").unwrap_or(ALL_INSTITUTIONS);

    let config = match arg_value(&args, "--config") {
        Some(path) => PeerConfig::load(path)?,
        None => PeerConfig::default(),
    };
    let engine = PeerEngine::new(config)?;

    let store = match arg_value(&args, "--db") {
        Some(db) => {
            let store = PeerStore::open(db)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    let tables = load_tables(&args, &engine, store.as_ref())?;

    if import {
        let Some(store) = store.as_ref() else {
            bail!("--import requires --db");
        };
        import_tables(store, &tables)?;
    }

    if summary_only {
        let built = outputs::build_outputs(&tables.metrics);
        if json {
            println!("{}", serde_json::to_string_pretty(&built.summary)?);
        } else {
            print_year_summary(&built);
        }
        return Ok(());
    }

    let (Some(year), Some(anchor)) = (
        parse_arg::<Year>(&args, "--year"),
        parse_arg::<InstitutionId>(&args, "--anchor"),
    ) else {
        if import {
            return Ok(());
        }
        bail!("--year and --anchor are required (or pass --summary / --import)");
    };

    let mut inputs = PeerInputs::new(&tables.metrics);
    if let Some(h) = tables.headcounts.as_ref() {
        inputs = inputs.with_headcounts(h);
    }
    if let Some(f) = tables.fallback.as_ref() {
        inputs = inputs.with_fallback(f);
    }

    let query = AnchorQuery::new(anchor, year, threshold)
        .robust(robust)
        .winsorized(winsorize);
    let report = engine.summarize_anchor(&inputs, &query)?;

    if json {
        let out = JsonReport {
            generated_at: chrono::Utc::now(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&report, &tables.source, robust);
    }

    Ok(())
}

fn load_tables(args: &[String], engine: &PeerEngine, store: Option<&PeerStore>) -> Result<Tables> {
    if let Some(n) = parse_arg::<usize>(args, "--mock") {
        let seed = parse_arg(args, "--seed").unwrap_or(42u64);
        let first_year = parse_arg::<Year>(args, "--year").unwrap_or(2023);
        let years: Vec<Year> = (first_year - 4..=first_year).collect();
        let mock = MockDataset::generate(seed, n, &years);
        return Ok(Tables {
            metrics: mock.metrics,
            headcounts: Some(mock.headcounts),
            fallback: Some(mock.fallback),
            source: format!("mock(seed={seed}, n={n})"),
        });
    }

    if let Some(path) = arg_value(args, "--metrics") {
        let metrics = loader::load_metric_csv(Path::new(path), &engine.config().metric_column)?;
        let headcounts = arg_value(args, "--headcounts")
            .map(|p| loader::load_headcount_csv(Path::new(p)))
            .transpose()?;
        return Ok(Tables {
            metrics,
            headcounts,
            fallback: None,
            source: path.to_string(),
        });
    }

    if let Some(store) = store {
        let metrics = store.load_metric_table(None)?;
        let headcounts = store.load_headcount_table(None)?;
        log::info!(
            "loaded {} metric / {} headcount rows from store",
            metrics.len(),
            headcounts.len()
        );
        return Ok(Tables {
            metrics,
            headcounts: (!headcounts.is_empty()).then_some(headcounts),
            fallback: None,
            source: store.path().unwrap_or(":memory:").to_string(),
        });
    }

    bail!("no data source: pass --metrics FILE, --mock N or --db PATH")
}

fn import_tables(store: &PeerStore, tables: &Tables) -> Result<()> {
    let years = tables.metrics.years();
    let year_range = years.first().zip(years.last()).map(|(a, b)| (*a, *b));

    let written = store.insert_metrics(&tables.metrics)?;
    let id = store.record_import(&tables.source, "metric", written, year_range)?;
    println!("imported {written} metric rows ({id})");

    if let Some(headcounts) = tables.headcounts.as_ref() {
        let written = store.insert_headcounts(headcounts)?;
        let id = store.record_import(&tables.source, "headcount", written, year_range)?;
        println!("imported {written} headcount rows ({id})");
    }
    Ok(())
}

fn print_report(report: &AnchorReport, source: &str, robust: bool) {
    let s = &report.summary;
    let p = &report.stats;

    println!("=== PEER GROUP ===");
    println!("  source:        {source}");
    println!("  year:          {}", p.year);
    println!("  threshold:     {} (min {})", p.threshold_label, p.min_headcount);
    println!("  peers:         {}", p.peer_count);
    println!("  mean / std:    {:.2} / {:.2}", p.mean, p.std);
    println!("  median / mad:  {:.2} / {:.2}", p.median, p.mad);
    println!("  winsorized:    {}", p.winsorized);
    println!();
    println!("=== ANCHOR ===");
    println!("  institution:   {} ({})", s.institution_name, s.institution_id);
    println!("  value:         {}", fmt_opt(s.metric_value));
    println!("  scored value:  {:.2}", report.scored_value);
    println!(
        "  headcount:     {} [{}]",
        fmt_opt(s.headcount),
        s.headcount_source.as_deref().unwrap_or("n/a")
    );
    println!("  in peer group: {}", s.in_peer_group);
    println!("  z-score:       {}", fmt_opt(s.z_score));
    println!("  robust z:      {}", fmt_opt(s.z_score_robust));
    println!("  percentile:    {}", fmt_opt(s.percentile));
    println!();

    let mode = if robust { "robust" } else { "standard" };
    println!("=== TOP PEERS ({mode} z) ===");
    let mut rows: Vec<_> = report.group.rows.iter().collect();
    rows.sort_by(|a, b| {
        b.z_score_active
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&a.z_score_active.unwrap_or(f64::NEG_INFINITY))
    });
    for row in rows.iter().take(10) {
        println!(
            "  {:<40} {:>7.1}  z={:>6}  pct={:>5.1}",
            row.institution_name,
            row.metric_value,
            fmt_opt(row.z_score_active),
            row.percentile
        );
    }
}

fn print_year_summary(built: &outputs::CanonicalOutputs) {
    println!("=== SUMMARY BY YEAR ===");
    for row in &built.summary {
        println!(
            "  {} | {:<40} | n={:>5} | avg={} | median={} | p25={} | p75={}",
            row.year,
            row.sector,
            row.institution_count,
            fmt_opt(row.avg),
            fmt_opt(row.median),
            fmt_opt(row.p25),
            fmt_opt(row.p75),
        );
    }
    println!(
        "  ({} source rows, {} institutions)",
        built.metadata.source_rows, built.metadata.latest_rows
    );
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    arg_value(args, flag).and_then(|v| v.parse().ok())
}
