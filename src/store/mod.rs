pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::conversion::ConversionRecorder;
use disk::DiskRecorder;
use memory::MemoryRecorder;
use tracing::warn;

/// Opens the persistent history store, falling back to an in-memory one when
/// the data directory is unavailable.
pub fn open_recorder(config: &AppConfig) -> Box<dyn ConversionRecorder> {
    let opened = config
        .data_path()
        .and_then(|path| DiskRecorder::open(&path.join("history")));

    match opened {
        Ok(recorder) => Box::new(recorder),
        Err(e) => {
            warn!(error = %e, "History store unavailable, conversions will not be persisted");
            Box::new(MemoryRecorder::new())
        }
    }
}
