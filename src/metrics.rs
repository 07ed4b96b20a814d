//! Process-wide memory readings for the run summary.

use std::sync::{OnceLock, RwLock};

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_mb: u64,
    pub used_mb: u64,
    pub avail_mb: u64,
}

static SYS: OnceLock<RwLock<System>> = OnceLock::new();

fn sys_handle() -> &'static RwLock<System> {
    SYS.get_or_init(|| {
        RwLock::new(System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        ))
    })
}

/// System memory in MB. All zeros if the write lock was poisoned.
pub fn memory_stats_mb() -> MemoryStats {
    let Ok(mut sys) = sys_handle().write() else {
        return MemoryStats::default();
    };
    sys.refresh_memory();
    let total_mb = sys.total_memory() / MB;
    let avail_mb = sys.available_memory() / MB;
    MemoryStats {
        total_mb,
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_never_exceeds_total() {
        let m = memory_stats_mb();
        assert!(m.used_mb <= m.total_mb);
        assert_eq!(m.used_mb + m.avail_mb, m.total_mb.max(m.avail_mb));
    }
}
