use crate::domain::model::{ColumnLayout, DateFormat, RawRecord};
use crate::domain::ports::Source;
use crate::sources::{line_text, selector, DMY_PATTERN};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::PathBuf;

pub const XSMN_URL: &str = "https://xosodaiphat.com/xsmn-200-ngay.html";
pub const XSMT_URL: &str = "https://xosodaiphat.com/xsmt-200-ngay.html";

pub const COL_DATE: &str = "Ngày";
pub const COL_PROVINCE: &str = "Tỉnh";
pub const COL_PRIZE8: &str = "Giải 8";
pub const COL_SPECIAL: &str = "Giải ĐB";

/// Southern and central sheets store ISO dates and track only the two
/// two-digit tiers.
pub fn southern_layout() -> ColumnLayout {
    ColumnLayout::new(
        &[COL_DATE, COL_PROVINCE, COL_PRIZE8, COL_SPECIAL],
        DateFormat::Iso,
    )
}

/// Southern (MN) and central (MT) results: one `div.block` per draw day,
/// date in the block heading, tier numbers pulled from the block text by
/// the `G.8` / `G.ĐB` label runs.
///
/// One adapter covers both regions; they differ only in province tag and
/// how many numbers each tier can carry (MN pages list up to four
/// provinces per day, MT up to three).
pub struct SouthernSource {
    region: String,
    province: String,
    take: usize,
    url: String,
    local_html: Option<PathBuf>,
    client: Client,
    layout: ColumnLayout,
    block_sel: Selector,
    title_sel: Selector,
    date_re: Regex,
    g8_re: Regex,
    gdb_re: Regex,
}

impl SouthernSource {
    pub fn xsmn(url: impl Into<String>, local_html: Option<PathBuf>) -> Self {
        Self::new("XSMN", "MN", 10, url, local_html)
    }

    pub fn xsmt(url: impl Into<String>, local_html: Option<PathBuf>) -> Self {
        Self::new("XSMT", "MT", 3, url, local_html)
    }

    fn new(
        region: &str,
        province: &str,
        take: usize,
        url: impl Into<String>,
        local_html: Option<PathBuf>,
    ) -> Self {
        Self {
            region: region.to_string(),
            province: province.to_string(),
            take,
            url: url.into(),
            local_html,
            client: Client::new(),
            layout: southern_layout(),
            block_sel: selector("div.block"),
            title_sel: selector("h2.class-title-list-link"),
            date_re: Regex::new(DMY_PATTERN).unwrap(),
            g8_re: Regex::new(r"G\.8\s*([\d\s]+)").unwrap(),
            gdb_re: Regex::new(r"G\.ĐB\s*([\d\s]+)").unwrap(),
        }
    }

    pub fn parse_document(&self, html: &str) -> Result<Vec<RawRecord>> {
        let doc = Html::parse_document(html);
        let blocks: Vec<ElementRef> = doc.select(&self.block_sel).collect();
        if blocks.is_empty() {
            return Err(EtlError::ParseError {
                message: format!("no {} result blocks (div.block)", self.region),
            });
        }

        let mut records = Vec::new();
        for block in blocks {
            let Some(title) = block.select(&self.title_sel).next() else {
                continue;
            };
            let Some(date_raw) = self
                .date_re
                .find(&line_text(&title))
                .map(|m| m.as_str().to_string())
            else {
                continue;
            };

            let text = line_text(&block);
            let g8 = self.tier_numbers(&self.g8_re, &text);
            let gdb = self.tier_numbers(&self.gdb_re, &text);
            if g8.is_empty() && gdb.is_empty() {
                continue;
            }

            let mut rec = RawRecord::new(date_raw);
            rec.set(COL_PROVINCE, self.province.clone());
            rec.set(COL_PRIZE8, g8);
            rec.set(COL_SPECIAL, gdb);
            records.push(rec);
        }
        Ok(records)
    }

    fn tier_numbers(&self, re: &Regex, text: &str) -> String {
        re.captures(text)
            .map(|c| {
                c[1].split_whitespace()
                    .take(self.take)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Source for SouthernSource {
    fn region(&self) -> &str {
        &self.region
    }

    fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let html = match &self.local_html {
            Some(path) => {
                tracing::info!("📂 Reading local HTML: {}", path.display());
                fs::read_to_string(path)?
            }
            None => {
                tracing::info!("🌍 Fetching online: {}", self.url);
                self.client
                    .get(&self.url)
                    .header(USER_AGENT, "Mozilla/5.0")
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };
        self.parse_document(&html)
    }
}
