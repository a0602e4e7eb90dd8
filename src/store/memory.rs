use crate::core::conversion::{
    ConversionRecord, ConversionRecorder, NewConversion, sort_newest_first,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory conversion history, lost when the process exits
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    inner: Arc<Mutex<Vec<ConversionRecord>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversionRecorder for MemoryRecorder {
    async fn record(&self, conversion: NewConversion) -> Result<ConversionRecord> {
        let mut records = self.inner.lock().await;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = ConversionRecord::from_new(id, conversion);
        debug!(id, "Memory record PUT");
        records.push(record.clone());
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        let mut records = self.inner.lock().await.clone();
        sort_newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }
}
