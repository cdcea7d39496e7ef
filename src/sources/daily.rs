use crate::core::dedup::dedup_tiers;
use crate::domain::model::{ColumnLayout, RawRecord};
use crate::domain::ports::Source;
use crate::sources::xsmb::{mb_layout, COL_ALL, MB_TIERS};
use crate::sources::{full_text, selector, DMY_PATTERN};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, Days, Local, NaiveDate};
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub const DAILY_URL_TEMPLATE: &str =
    "https://www.xosominhngoc.com/ket-qua-xo-so/mien-bac/{dd}-{mm}-{yyyy}.html";

const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Northern archive walked one draw per page: the URL is templated by date
/// and scanned backwards from the start date until `target_periods` draws
/// are collected or the window is exhausted. Days without a result table
/// (no draw published) are skipped; transport failures end the run.
pub struct DailySource {
    url_template: String,
    window_days: usize,
    target_periods: usize,
    /// Walk starts here; `None` means today.
    start_date: Option<NaiveDate>,
    fetch_delay: Duration,
    client: Client,
    layout: ColumnLayout,
    table_sel: Selector,
    marker_sel: Selector,
    date_cell_sel: Selector,
    special_row_sel: Selector,
    special_cell_sel: Selector,
    cell_sel: Selector,
    tier_cell_sels: Vec<(&'static str, Selector)>,
    date_re: Regex,
    tag_re: Regex,
    num_re: Regex,
}

impl DailySource {
    pub fn new(
        url_template: impl Into<String>,
        window_days: usize,
        target_periods: usize,
        start_date: Option<NaiveDate>,
        fetch_delay: Duration,
    ) -> Self {
        let tier_cell_sels = (1..=7)
            .map(|i| (MB_TIERS[i], selector(&format!("td.giai{i}"))))
            .collect();
        Self {
            url_template: url_template.into(),
            window_days,
            target_periods,
            start_date,
            fetch_delay,
            client: Client::new(),
            layout: mb_layout(),
            table_sel: selector("table"),
            marker_sel: selector("td.giaidb, td.giai1"),
            date_cell_sel: selector("td.ngay"),
            special_row_sel: selector("tr.giaidb, tr.db"),
            special_cell_sel: selector("td.giaidb"),
            cell_sel: selector("td"),
            tier_cell_sels,
            date_re: Regex::new(DMY_PATTERN).unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            num_re: Regex::new(r"\b\d{2,}\b").unwrap(),
        }
    }

    fn url_for(&self, date: NaiveDate) -> String {
        self.url_template
            .replace("{dd}", &format!("{:02}", date.day()))
            .replace("{mm}", &format!("{:02}", date.month()))
            .replace("{yyyy}", &date.year().to_string())
    }

    /// `None` when the page carries no result table, i.e. no draw that day.
    pub fn parse_page(&self, html: &str, expected_date: &str) -> Option<RawRecord> {
        let doc = Html::parse_document(html);
        let table = doc
            .select(&self.table_sel)
            .find(|t| t.select(&self.marker_sel).next().is_some())?;

        let date_raw = table
            .select(&self.date_cell_sel)
            .next()
            .and_then(|cell| {
                let text = full_text(&cell);
                self.date_re.find(&text).map(|m| m.as_str().to_string())
            })
            .unwrap_or_else(|| expected_date.to_string());

        let mut rec = RawRecord::new(date_raw);
        for tier in MB_TIERS {
            rec.set(tier, "");
        }

        // Special prize: second cell of the marked row, then the marked
        // cell itself.
        if let Some(row) = table.select(&self.special_row_sel).next() {
            let cells: Vec<ElementRef> = row.select(&self.cell_sel).collect();
            if cells.len() > 1 {
                rec.set(MB_TIERS[0], self.clean_numbers(&cells[1]));
            }
        }
        if rec.get(MB_TIERS[0]).is_some_and(str::is_empty) {
            if let Some(cell) = table.select(&self.special_cell_sel).next() {
                rec.set(MB_TIERS[0], self.clean_numbers(&cell));
            }
        }

        for (tier, sel) in &self.tier_cell_sels {
            if let Some(cell) = table.select(sel).next() {
                rec.set(tier, self.clean_numbers(&cell));
            }
        }

        let all = dedup_tiers(&mut rec, &MB_TIERS);
        rec.set(COL_ALL, all);
        Some(rec)
    }

    /// Strip markup, pull the 2+ digit runs, drop in-cell repeats while
    /// keeping first-seen order.
    fn clean_numbers(&self, cell: &ElementRef) -> String {
        let html = cell.html();
        let text = self.tag_re.replace_all(&html, " ");
        let mut seen = Vec::new();
        for m in self.num_re.find_iter(&text) {
            if !seen.iter().any(|s| s == m.as_str()) {
                seen.push(m.as_str().to_string());
            }
        }
        seen.join(" ")
    }
}

#[async_trait]
impl Source for DailySource {
    fn region(&self) -> &str {
        "XSMB"
    }

    fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let start = self
            .start_date
            .unwrap_or_else(|| Local::now().date_naive());
        let mut records = Vec::new();

        for offset in 0..self.window_days {
            let Some(date) = start.checked_sub_days(Days::new(offset as u64)) else {
                break;
            };
            if offset > 0 && !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }

            let url = self.url_for(date);
            tracing::debug!("🌍 Fetching {}", url);
            let response = self
                .client
                .get(&url)
                .header(USER_AGENT, BROWSER_UA)
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9,vi;q=0.8")
                .header(REFERER, "https://www.google.com/")
                .send()
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                tracing::debug!("ℹ️ No page for {}", date);
                continue;
            }
            let body = response.error_for_status()?.text().await?;

            let expected = date.format("%d/%m/%Y").to_string();
            match self.parse_page(&body, &expected) {
                Some(rec) => {
                    records.push(rec);
                    if records.len() >= self.target_periods {
                        break;
                    }
                }
                None => tracing::debug!("ℹ️ No draw published for {}", date),
            }
        }

        tracing::info!("✅ Collected {} draws from the archive", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const DAY_PAGE: &str = r#"
        <html><body>
          <table>
            <tr><td class="ngay"><a>Thứ tư - 03/01/2024</a></td></tr>
            <tr class="giaidb"><td>ĐB</td><td class="giaidb"><div>12345</div></td></tr>
            <tr><td>1</td><td class="giai1">67890</td></tr>
            <tr><td>3</td><td class="giai3"><span>11111</span><span>22222</span><span>11111</span></td></tr>
            <tr><td>7</td><td class="giai7"><span>12</span><span>34</span></td></tr>
          </table>
        </body></html>
    "#;

    fn source_for(template: String, window: usize, target: usize) -> DailySource {
        DailySource::new(
            template,
            window,
            target,
            NaiveDate::from_ymd_opt(2024, 1, 3),
            Duration::ZERO,
        )
    }

    #[test]
    fn parses_tier_cells_by_class() {
        let source = source_for(DAILY_URL_TEMPLATE.to_string(), 1, 1);
        let rec = source.parse_page(DAY_PAGE, "03/01/2024").unwrap();

        assert_eq!(rec.date_raw, "03/01/2024");
        assert_eq!(rec.get("Giải ĐB"), Some("12345"));
        assert_eq!(rec.get("Giải 1"), Some("67890"));
        // Markup stripped, in-cell repeat dropped.
        assert_eq!(rec.get("Giải 3"), Some("11111 22222"));
        assert_eq!(rec.get("Giải 7"), Some("12 34"));
        assert_eq!(rec.get("Tất cả"), Some("12345 67890 11111 22222 12 34"));
    }

    #[test]
    fn page_without_result_table_means_no_draw() {
        let source = source_for(DAILY_URL_TEMPLATE.to_string(), 1, 1);
        assert!(source
            .parse_page("<html><table><tr><td>news</td></tr></table></html>", "x")
            .is_none());
    }

    #[test]
    fn missing_date_cell_falls_back_to_the_requested_date() {
        let html = r#"<table><tr><td class="giai1">67890</td></tr></table>"#;
        let source = source_for(DAILY_URL_TEMPLATE.to_string(), 1, 1);
        let rec = source.parse_page(html, "02/01/2024").unwrap();
        assert_eq!(rec.date_raw, "02/01/2024");
    }

    #[tokio::test]
    async fn walks_backwards_until_target_periods() {
        let server = MockServer::start();
        let day3 = server.mock(|when, then| {
            when.method(GET).path("/kq/03-01-2024.html");
            then.status(200).body(DAY_PAGE);
        });
        let day2 = server.mock(|when, then| {
            when.method(GET).path("/kq/02-01-2024.html");
            then.status(200).body(DAY_PAGE.replace("03/01/2024", "02/01/2024"));
        });

        let source = source_for(server.url("/kq/{dd}-{mm}-{yyyy}.html"), 10, 2);
        let records = source.fetch().await.unwrap();

        day3.assert();
        day2.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date_raw, "03/01/2024");
        assert_eq!(records[1].date_raw, "02/01/2024");
    }

    #[tokio::test]
    async fn missing_days_are_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/kq/03-01-2024.html");
            then.status(200).body(DAY_PAGE);
        });
        // 02/01 is unmatched and returns 404.
        server.mock(|when, then| {
            when.method(GET).path("/kq/01-01-2024.html");
            then.status(200).body(DAY_PAGE.replace("03/01/2024", "01/01/2024"));
        });

        let source = source_for(server.url("/kq/{dd}-{mm}-{yyyy}.html"), 3, 2);
        let records = source.fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date_raw, "01/01/2024");
    }
}
