//! Tracing/logging setup shared by the indexer binaries.

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_DIRECTIVES);
}

/// Tracing configuration (filters, formatter).
pub mod tracing;
