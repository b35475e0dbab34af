//! Constants for the download module (timeouts, buffering).

/// Limit on connecting and on each body read of a file download.
///
/// There is no overall deadline: a slow transfer succeeds as long as it
/// never stalls for this long.
pub const FETCH_TIMEOUT_SECS: u64 = 60;

/// Write buffer size used while streaming a body to disk.
pub const CHUNK_SIZE: usize = 8 * 1024;
