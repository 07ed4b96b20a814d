//! Run summary: what was read, what was resolved, how long it took.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use log::info;

use crate::engine::MappingStats;
use crate::report::Layout;

const KST_OFFSET_SECS: i32 = 9 * 3600;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub profile: String,
    pub rules_version: String,
    pub layout: Layout,
    pub channel_list: PathBuf,
    pub settlements: Vec<PathBuf>,
    pub master: PathBuf,
    pub stats: MappingStats,
    pub load_time: Duration,
    pub compute_time: Duration,
    pub export_time: Duration,
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
    pub outputs: Vec<PathBuf>,
}

fn fmt_kst(dt: &DateTime<Utc>) -> String {
    match FixedOffset::east_opt(KST_OFFSET_SECS) {
        Some(tz) => format!(
            "{} KST",
            dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S")
        ),
        None => format!("{} UTC", dt.format("%Y-%m-%d %H:%M:%S")),
    }
}

// HH:MM:SS; hours may exceed 23.
fn fmt_duration(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RunSummary {
    /// Key/value rows shared by the workbook sheet and the summary CSV.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let s = &self.stats;
        vec![
            ("Profile", self.profile.clone()),
            ("Rule set", self.rules_version.clone()),
            ("Layout", self.layout.to_string()),
            ("Channel list", self.channel_list.display().to_string()),
            ("Settlement files", display_paths(&self.settlements)),
            ("Content master", self.master.display().to_string()),
            ("Rows (channel list)", s.channel_rows.to_string()),
            ("Rows (settlement)", s.settlement_rows.to_string()),
            ("Rows (content master)", s.master_rows.to_string()),
            ("Channel index keys", s.channel_index_size.to_string()),
            ("Master index keys", s.master_index_size.to_string()),
            ("Channel hits", s.channel_hits.to_string()),
            ("Master hits", s.master_hits.to_string()),
            ("Mapped pairs", s.distinct_pairs.to_string()),
            ("Unmapped titles", s.identity_pairs.to_string()),
            ("Unmatched titles", s.unmatched.to_string()),
            ("Load time (ms)", self.load_time.as_millis().to_string()),
            ("Compute time (ms)", self.compute_time.as_millis().to_string()),
            ("Started (KST)", fmt_kst(&self.started_utc)),
            ("Ended (KST)", fmt_kst(&self.ended_utc)),
            ("Duration", fmt_duration(self.duration_secs)),
            ("Memory used start (MB)", self.mem_used_start_mb.to_string()),
            ("Memory used end (MB)", self.mem_used_end_mb.to_string()),
        ]
    }

    pub fn log(&self) {
        for (k, v) in self.entries() {
            info!("{k}: {v}");
        }
        info!("Export time (ms): {}", self.export_time.as_millis());
        for out in &self.outputs {
            info!("wrote {}", out.display());
        }
    }
}

/// Builder for [`RunSummary`].
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    profile: String,
    rules_version: String,
    layout: Layout,
    channel_list: PathBuf,
    settlements: Vec<PathBuf>,
    master: PathBuf,
    stats: MappingStats,
    load_time: Duration,
    compute_time: Duration,
    export_time: Duration,
    mem_used_start_mb: u64,
    mem_used_end_mb: u64,
    started_utc: DateTime<Utc>,
    ended_utc: DateTime<Utc>,
    outputs: Vec<PathBuf>,
}

impl SummaryBuilder {
    pub fn new(profile: &str, rules_version: &str) -> Self {
        let now = Utc::now();
        Self {
            profile: profile.to_string(),
            rules_version: rules_version.to_string(),
            layout: Layout::default(),
            channel_list: PathBuf::new(),
            settlements: Vec::new(),
            master: PathBuf::new(),
            stats: MappingStats::default(),
            load_time: Duration::ZERO,
            compute_time: Duration::ZERO,
            export_time: Duration::ZERO,
            mem_used_start_mb: 0,
            mem_used_end_mb: 0,
            started_utc: now,
            ended_utc: now,
            outputs: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, channel_list: &Path, settlements: &[PathBuf], master: &Path) -> Self {
        self.channel_list = channel_list.to_path_buf();
        self.settlements = settlements.to_vec();
        self.master = master.to_path_buf();
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_stats(mut self, stats: MappingStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_timings(mut self, load: Duration, compute: Duration) -> Self {
        self.load_time = load;
        self.compute_time = compute;
        self
    }

    pub fn with_export_time(mut self, export: Duration) -> Self {
        self.export_time = export;
        self
    }

    pub fn with_memory(mut self, start_mb: u64, end_mb: u64) -> Self {
        self.mem_used_start_mb = start_mb;
        self.mem_used_end_mb = end_mb;
        self
    }

    pub fn with_timestamps(mut self, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PathBuf>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn build(self) -> RunSummary {
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        RunSummary {
            profile: self.profile,
            rules_version: self.rules_version,
            layout: self.layout,
            channel_list: self.channel_list,
            settlements: self.settlements,
            master: self.master,
            stats: self.stats,
            load_time: self.load_time,
            compute_time: self.compute_time,
            export_time: self.export_time,
            mem_used_start_mb: self.mem_used_start_mb,
            mem_used_end_mb: self.mem_used_end_mb,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(fmt_duration(0.4), "00:00:00");
        assert_eq!(fmt_duration(3725.0), "01:02:05");
        assert_eq!(fmt_duration(90_000.0), "25:00:00");
    }

    #[test]
    fn test_builder_fills_entries() {
        let started = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ended = started + chrono::Duration::seconds(65);
        let summary = SummaryBuilder::new("레진KR", "builtin-1")
            .with_stats(MappingStats {
                settlement_rows: 12,
                unmatched: 3,
                ..Default::default()
            })
            .with_timestamps(started, ended)
            .build();
        assert_eq!(summary.duration_secs, 65.0);
        let entries = summary.entries();
        let get = |k: &str| {
            entries
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("Profile"), "레진KR");
        assert_eq!(get("Rows (settlement)"), "12");
        assert_eq!(get("Unmatched titles"), "3");
        assert_eq!(get("Started (KST)"), "2024-06-01 09:00:00 KST");
        assert_eq!(get("Duration"), "00:01:05");
    }
}
