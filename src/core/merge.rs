use crate::domain::model::{ColumnLayout, RecordSet, WriteStrategy};
use crate::domain::ports::Sink;
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use std::time::Duration;

/// Result of one merge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Unique dated records offered to the sink.
    pub incoming: usize,
    /// Rows actually written.
    pub written: usize,
    /// Incoming records whose date was already stored.
    pub skipped_existing: usize,
}

/// Date-keyed reconciliation against a sheet-like sink.
///
/// Writes are chunked into batches of `batch_size` rows with `batch_delay`
/// between successive batches, to respect the store's rate limits. The
/// delay is pacing, not retry.
#[derive(Debug, Clone)]
pub struct Merger {
    strategy: WriteStrategy,
    batch_size: usize,
    batch_delay: Duration,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(WriteStrategy::Prepend, 50, Duration::from_secs(2))
    }
}

impl Merger {
    pub fn new(strategy: WriteStrategy, batch_size: usize, batch_delay: Duration) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            strategy,
            batch_size,
            batch_delay,
        }
    }

    /// Reconcile `records` into the sink.
    ///
    /// Idempotent: a second pass with the same records writes nothing
    /// (`Prepend`) or rewrites identical content (`Rebuild`).
    pub async fn merge<K: Sink>(
        &self,
        sink: &mut K,
        layout: &ColumnLayout,
        records: &RecordSet,
    ) -> Result<MergeOutcome> {
        match self.strategy {
            WriteStrategy::Prepend => self.prepend(sink, layout, records).await,
            WriteStrategy::Rebuild => self.rebuild(sink, layout, records).await,
        }
    }

    async fn prepend<K: Sink>(
        &self,
        sink: &mut K,
        layout: &ColumnLayout,
        records: &RecordSet,
    ) -> Result<MergeOutcome> {
        let header = sink.read_header().await?;

        if header.is_empty() {
            tracing::info!("📝 Empty sheet, writing header and {} rows", records.len());
            sink.append_rows(&[layout.columns().to_vec()]).await?;
            let rows: Vec<Vec<String>> =
                records.records().iter().map(|r| r.to_row(layout)).collect();
            self.paced_append(sink, &rows).await?;
            return Ok(MergeOutcome {
                incoming: records.len(),
                written: rows.len(),
                skipped_existing: 0,
            });
        }

        // Never write into a sheet whose columns we do not recognize.
        if header != layout.columns() {
            return Err(EtlError::HeaderMismatch {
                expected: layout.columns().to_vec(),
                found: header,
            });
        }

        let existing: HashSet<String> = sink
            .read_key_column()
            .await?
            .into_iter()
            .skip(1) // header cell
            .collect();

        let new_rows: Vec<Vec<String>> = records
            .records()
            .iter()
            .filter(|r| !existing.contains(&layout.key_of(r)))
            .map(|r| r.to_row(layout))
            .collect();

        if new_rows.is_empty() {
            tracing::info!("ℹ️ No new dates to insert");
            return Ok(MergeOutcome {
                incoming: records.len(),
                written: 0,
                skipped_existing: records.len(),
            });
        }

        // Open a gap under the header so existing rows, extra columns
        // included, shift down unchanged.
        sink.insert_blank_rows(1, new_rows.len()).await?;

        let mut at_row = 1;
        for (i, chunk) in new_rows.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            sink.write_range(at_row, chunk).await?;
            tracing::debug!("✅ Wrote {} rows at row {}", chunk.len(), at_row);
            at_row += chunk.len();
        }

        Ok(MergeOutcome {
            incoming: records.len(),
            written: new_rows.len(),
            skipped_existing: records.len() - new_rows.len(),
        })
    }

    async fn rebuild<K: Sink>(
        &self,
        sink: &mut K,
        layout: &ColumnLayout,
        records: &RecordSet,
    ) -> Result<MergeOutcome> {
        tracing::info!("🧹 Clearing worksheet before rewrite");
        sink.clear().await?;
        sink.append_rows(&[layout.columns().to_vec()]).await?;

        let rows: Vec<Vec<String>> = records.records().iter().map(|r| r.to_row(layout)).collect();
        self.paced_append(sink, &rows).await?;

        Ok(MergeOutcome {
            incoming: records.len(),
            written: rows.len(),
            skipped_existing: 0,
        })
    }

    async fn paced_append<K: Sink>(&self, sink: &mut K, rows: &[Vec<String>]) -> Result<()> {
        for (i, chunk) in rows.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            sink.append_rows(chunk).await?;
            tracing::debug!("✅ Appended {} rows", chunk.len());
        }
        Ok(())
    }
}
