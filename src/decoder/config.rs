//! Environment overrides for decode defaults, read once per process

use std::sync::OnceLock;

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

static EDGE_THRESHOLD: OnceLock<u32> = OnceLock::new();

/// Minimum edge strength, 1..=100 percent of full contrast
pub(crate) fn edge_threshold() -> u32 {
    *EDGE_THRESHOLD
        .get_or_init(|| parse_env_usize("DMTX_EDGE_THRESHOLD", 10).clamp(1, 100) as u32)
}

static SQUARE_DEVN_DEG: OnceLock<f64> = OnceLock::new();

/// Tolerated deviation from a right angle at the symbol corners
pub(crate) fn square_devn_degrees() -> f64 {
    *SQUARE_DEVN_DEG.get_or_init(|| parse_env_f64("DMTX_SQUARE_DEVN_DEG", 40.0).clamp(1.0, 89.0))
}

static SCAN_GAP: OnceLock<u32> = OnceLock::new();

pub(crate) fn scan_gap() -> u32 {
    *SCAN_GAP.get_or_init(|| parse_env_usize("DMTX_SCAN_GAP", 2).clamp(1, 64) as u32)
}

static TIMEOUT_MS: OnceLock<u64> = OnceLock::new();

/// Decode time budget; 0 disables the timeout
pub(crate) fn timeout_ms() -> u64 {
    *TIMEOUT_MS.get_or_init(|| parse_env_u64("DMTX_TIMEOUT_MS", 0))
}

static MAX_RESULTS: OnceLock<usize> = OnceLock::new();

/// Result cap; 0 means unlimited
pub(crate) fn max_results() -> usize {
    *MAX_RESULTS.get_or_init(|| parse_env_usize("DMTX_MAX_RESULTS", 0))
}

static MAX_DIM: OnceLock<u32> = OnceLock::new();

/// Longest image side accepted by the loader before downscaling; 0 keeps full resolution
pub(crate) fn max_dim() -> u32 {
    *MAX_DIM.get_or_init(|| parse_env_usize("DMTX_MAX_DIM", 0).min(u32::MAX as usize) as u32)
}
