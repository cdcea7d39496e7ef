use crate::core::merge::{MergeOutcome, Merger};
use crate::domain::model::{DatePolicy, RecordSet};
use crate::domain::ports::{Sink, Source};
use crate::utils::error::Result;

/// One-shot fetch → normalize → merge run for a single region.
pub struct IngestEngine<S: Source, K: Sink> {
    source: S,
    sink: K,
    merger: Merger,
    policy: DatePolicy,
}

impl<S: Source, K: Sink> IngestEngine<S, K> {
    pub fn new(source: S, sink: K, merger: Merger, policy: DatePolicy) -> Self {
        Self {
            source,
            sink,
            merger,
            policy,
        }
    }

    pub async fn run(&mut self) -> Result<MergeOutcome> {
        tracing::info!("🚀 Fetching {} results...", self.source.region());
        let raw = self.source.fetch().await?;

        if raw.is_empty() {
            tracing::warn!("ℹ️ Source returned no records, nothing to merge");
            return Ok(MergeOutcome::default());
        }
        tracing::info!("✅ Scraped {} records", raw.len());

        let records = RecordSet::normalize(raw, self.source.scrape_date_format(), self.policy)?;
        tracing::info!("✅ {} unique draws after normalization", records.len());

        let outcome = self
            .merger
            .merge(&mut self.sink, self.source.layout(), &records)
            .await?;

        if outcome.written == 0 {
            tracing::info!("ℹ️ Sheet already up to date");
        } else {
            tracing::info!(
                "🎯 Wrote {} new rows ({} already present)",
                outcome.written,
                outcome.skipped_existing
            );
        }
        Ok(outcome)
    }
}
