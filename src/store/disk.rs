use crate::core::conversion::{
    ConversionRecord, ConversionRecorder, NewConversion, sort_newest_first,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

const PARTITION_NAME: &str = "conversions";

/// Conversion history persisted in a fjall keyspace.
///
/// Records are keyed by their big-endian id, so key order is insertion order.
pub struct DiskRecorder {
    keyspace: Keyspace,
    partition: PartitionHandle,
    write_lock: Mutex<()>,
}

impl DiskRecorder {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open history store at {}", path.display()))?;
        let partition =
            keyspace.open_partition(PARTITION_NAME, PartitionCreateOptions::default())?;
        debug!("Opened history store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
            write_lock: Mutex::new(()),
        })
    }

    fn next_id(&self) -> Result<u64> {
        match self.partition.last_key_value()? {
            Some((key, _)) => Ok(decode_id(&key)? + 1),
            None => Ok(1),
        }
    }
}

fn decode_id(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .with_context(|| format!("Malformed history key of {} bytes", key.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl ConversionRecorder for DiskRecorder {
    async fn record(&self, conversion: NewConversion) -> Result<ConversionRecord> {
        let _guard = self.write_lock.lock().await;

        let id = self.next_id()?;
        let record = ConversionRecord::from_new(id, conversion);
        self.partition
            .insert(id.to_be_bytes().to_vec(), serde_json::to_vec(&record)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(id, "Disk record PUT");

        Ok(record)
    }

    /// Reads the newest `limit` records by id, then orders that window by date.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        let mut records = Vec::new();
        for item in self.partition.iter().rev().take(limit) {
            let (_, value) = item?;
            let record: ConversionRecord = serde_json::from_slice(&value)
                .context("Failed to parse stored conversion record")?;
            records.push(record);
        }
        debug!(count = records.len(), "Disk records read");

        sort_newest_first(&mut records);
        Ok(records)
    }
}
