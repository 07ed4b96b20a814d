//! One mapping run: resolve the reference file, load the tables, compute,
//! export atomically and summarize.

pub mod summary;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::config::AppConfig;
use crate::engine::{EngineOptions, SourceTables, run_mapping};
use crate::export::write_outputs;
use crate::metrics::memory_stats_mb;
use crate::normalize::RuleSet;
use crate::table::{load_table, load_tables};

use summary::{RunSummary, SummaryBuilder};

fn load_sources(cfg: &AppConfig, master_path: &Path) -> Result<SourceTables> {
    let channel = load_table(&cfg.input.channel_list)
        .with_context(|| "loading channel content list")?;
    let settlement = load_tables("settlement", &cfg.input.settlements)
        .with_context(|| "loading settlement report")?;
    let master = load_table(master_path).with_context(|| "loading content master")?;
    info!(
        "loaded tables: channel list={} rows, settlement={} rows ({} files), content master={} rows",
        channel.len(),
        settlement.len(),
        cfg.input.settlements.len(),
        master.len()
    );
    Ok(SourceTables {
        channel,
        settlement,
        master,
    })
}

/// Execute a full run for a validated configuration.
pub fn run(cfg: &AppConfig) -> Result<RunSummary> {
    let started_utc = Utc::now();
    let mem_start = memory_stats_mb().used_mb;

    let profile = cfg.input.profile;
    let master_path = profile.resolve_reference(&cfg.input.data_dir)?;
    info!("{}", profile.notice());

    let custom_rules;
    let rules: &RuleSet = match cfg.mapping.rules_path {
        Some(ref path) => {
            custom_rules = RuleSet::load_csv(path)
                .with_context(|| format!("loading rules from {}", path.display()))?;
            &custom_rules
        }
        None => RuleSet::builtin(),
    };
    info!("rule set {} ({} rules)", rules.version(), rules.len());

    let t_load = Instant::now();
    let tables = load_sources(cfg, &master_path)?;
    let load_time = t_load.elapsed();

    let t_compute = Instant::now();
    let mapping = run_mapping(
        &tables,
        rules,
        EngineOptions {
            layout: cfg.mapping.layout,
            parallel: cfg.mapping.parallel,
        },
    )?;
    let compute_time = t_compute.elapsed();

    let builder = SummaryBuilder::new(profile.label(), rules.version())
        .with_inputs(&cfg.input.channel_list, &cfg.input.settlements, &master_path)
        .with_layout(cfg.mapping.layout)
        .with_stats(mapping.stats.clone())
        .with_timings(load_time, compute_time)
        .with_memory(mem_start, memory_stats_mb().used_mb)
        .with_timestamps(started_utc, Utc::now());

    let base = cfg.output_base();
    let t_export = Instant::now();
    let outputs = write_outputs(
        &base,
        cfg.export.format,
        &mapping.report,
        &builder.clone().build(),
    )
    .with_context(|| format!("writing report to {}", base.display()))?;

    let summary = builder
        .with_export_time(t_export.elapsed())
        .with_memory(mem_start, memory_stats_mb().used_mb)
        .with_timestamps(started_utc, Utc::now())
        .with_outputs(outputs)
        .build();
    summary.log();
    Ok(summary)
}
