use std::time::Duration;

use async_trait::async_trait;
use xoso_etl::{
    ColumnLayout, DateFormat, DatePolicy, IngestEngine, MemorySink, Merger, RawRecord, RecordSet,
    Source, WriteStrategy,
};

fn layout() -> ColumnLayout {
    ColumnLayout::new(&["Ngày", "Giải ĐB"], DateFormat::Iso)
}

fn records(dates: &[&str]) -> RecordSet {
    let raws: Vec<RawRecord> = dates
        .iter()
        .map(|d| {
            let mut r = RawRecord::new(*d);
            r.set("Giải ĐB", format!("sp-{}", d));
            r
        })
        .collect();
    RecordSet::normalize(raws, DateFormat::DayMonthYear, DatePolicy::Abort).unwrap()
}

fn merger() -> Merger {
    Merger::new(WriteStrategy::Prepend, 50, Duration::ZERO)
}

#[tokio::test]
async fn empty_sink_bootstrap_orders_rows_most_recent_first() {
    let mut sink = MemorySink::new();
    let set = records(&["03/01/2024", "01/01/2024", "02/01/2024"]);

    let outcome = merger().merge(&mut sink, &layout(), &set).await.unwrap();

    assert_eq!(outcome.written, 3);
    let keys = sink.grid().key_column();
    assert_eq!(keys, vec!["Ngày", "2024-01-03", "2024-01-02", "2024-01-01"]);
}

#[tokio::test]
async fn overlapping_dates_only_insert_the_new_one_above() {
    let mut sink = MemorySink::from_rows(vec![
        vec!["Ngày".into(), "Giải ĐB".into()],
        vec!["2024-01-03".into(), "original".into(), "kept-extra".into()],
    ]);
    let set = records(&["03/01/2024", "04/01/2024"]);

    let outcome = merger().merge(&mut sink, &layout(), &set).await.unwrap();

    assert_eq!(outcome.written, 1);
    assert_eq!(outcome.skipped_existing, 1);
    let rows = sink.grid().rows();
    assert_eq!(rows[1][0], "2024-01-04");
    assert_eq!(
        rows[2],
        vec!["2024-01-03", "original", "kept-extra"],
        "the previously existing row must be untouched"
    );
}

#[tokio::test]
async fn untouched_rows_keep_their_relative_positions() {
    let mut sink = MemorySink::from_rows(vec![
        vec!["Ngày".into(), "Giải ĐB".into()],
        vec!["2024-01-02".into(), "b".into()],
        vec!["2024-01-01".into(), "a".into(), "margin note".into()],
    ]);
    let set = records(&["03/01/2024"]);

    merger().merge(&mut sink, &layout(), &set).await.unwrap();

    let keys = sink.grid().key_column();
    assert_eq!(
        keys,
        vec!["Ngày", "2024-01-03", "2024-01-02", "2024-01-01"]
    );
    assert_eq!(sink.grid().rows()[3][2], "margin note");
}

struct FixedSource {
    layout: ColumnLayout,
    raws: Vec<RawRecord>,
}

#[async_trait]
impl Source for FixedSource {
    fn region(&self) -> &str {
        "fixed"
    }

    fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    async fn fetch(&self) -> xoso_etl::Result<Vec<RawRecord>> {
        Ok(self.raws.clone())
    }
}

#[tokio::test]
async fn engine_treats_an_empty_source_as_a_benign_no_op() {
    let source = FixedSource {
        layout: layout(),
        raws: Vec::new(),
    };
    let mut engine = IngestEngine::new(
        source,
        MemorySink::new(),
        merger(),
        DatePolicy::DropUnparsable,
    );

    let outcome = engine.run().await.unwrap();
    assert_eq!(outcome.written, 0);
    assert_eq!(outcome.incoming, 0);
}

#[tokio::test]
async fn engine_applies_the_date_policy() {
    let mut bad = RawRecord::new("not-a-date");
    bad.set("Giải ĐB", "x");
    let mut good = RawRecord::new("03/01/2024");
    good.set("Giải ĐB", "12345");

    let source = FixedSource {
        layout: layout(),
        raws: vec![bad.clone(), good.clone()],
    };
    let mut engine = IngestEngine::new(
        source,
        MemorySink::new(),
        merger(),
        DatePolicy::DropUnparsable,
    );
    let outcome = engine.run().await.unwrap();
    assert_eq!(outcome.written, 1);

    let source = FixedSource {
        layout: layout(),
        raws: vec![bad, good],
    };
    let mut engine = IngestEngine::new(source, MemorySink::new(), merger(), DatePolicy::Abort);
    assert!(engine.run().await.is_err());
}
