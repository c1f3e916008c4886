use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether per-candidate rejection logging is on (`DMTX_DEBUG` set)
pub(crate) fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| std::env::var("DMTX_DEBUG").is_ok())
}
