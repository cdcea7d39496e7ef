use crate::core::dedup::dedup_tiers;
use crate::domain::model::{ColumnLayout, DateFormat, RawRecord};
use crate::domain::ports::Source;
use crate::sources::{full_text, selector, DMY_PATTERN};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::PathBuf;

pub const XSMB_URL: &str = "https://xosodaiphat.com/xsmb-200-ngay.html";

/// Prize tiers in sheet order; also the cross-tier dedup priority, special
/// prize first.
pub const MB_TIERS: [&str; 8] = [
    "Giải ĐB",
    "Giải 1",
    "Giải 2",
    "Giải 3",
    "Giải 4",
    "Giải 5",
    "Giải 6",
    "Giải 7",
];

pub const COL_DATE: &str = "Ngày";
pub const COL_ALL: &str = "Tất cả";

pub fn mb_layout() -> ColumnLayout {
    let mut columns = vec![COL_DATE];
    columns.extend(MB_TIERS);
    columns.push(COL_ALL);
    ColumnLayout::new(&columns, DateFormat::DayMonthYear)
}

/// Northern results, one page listing a table per draw day
/// (`table.table-xsmb`), the date printed in a heading or anchor above
/// each table.
pub struct XsmbSource {
    url: String,
    local_html: Option<PathBuf>,
    client: Client,
    layout: ColumnLayout,
    table_sel: Selector,
    row_sel: Selector,
    cell_sel: Selector,
    span_sel: Selector,
    link_sel: Selector,
    special_fallback_sel: Selector,
    date_re: Regex,
    digits_re: Regex,
    label_ws_re: Regex,
    special_label_re: Regex,
    tier_label_res: Vec<(&'static str, Regex)>,
}

impl XsmbSource {
    pub fn new(url: impl Into<String>, local_html: Option<PathBuf>) -> Self {
        let tier_label_res = (1..=7)
            .map(|i| {
                (
                    MB_TIERS[i],
                    Regex::new(&format!(r"\bgiải\s*{i}\b|\bg\.?\s*{i}\b")).unwrap(),
                )
            })
            .collect();
        Self {
            url: url.into(),
            local_html,
            client: Client::new(),
            layout: mb_layout(),
            table_sel: selector("table.table-xsmb"),
            row_sel: selector("tr"),
            cell_sel: selector("td"),
            span_sel: selector("span"),
            link_sel: selector("a"),
            special_fallback_sel: selector("span.special-prize-lg, span.special-code"),
            date_re: Regex::new(DMY_PATTERN).unwrap(),
            digits_re: Regex::new(r"\d+").unwrap(),
            label_ws_re: Regex::new(r"[\s.:]+").unwrap(),
            special_label_re: Regex::new(r"đb|đặc|dacbiet|g\.?đb|gdb").unwrap(),
            tier_label_res,
        }
    }

    pub fn parse_document(&self, html: &str) -> Result<Vec<RawRecord>> {
        let doc = Html::parse_document(html);
        let tables: Vec<ElementRef> = doc.select(&self.table_sel).collect();
        if tables.is_empty() {
            return Err(EtlError::ParseError {
                message: "no result tables (table.table-xsmb)".to_string(),
            });
        }

        let mut records = Vec::with_capacity(tables.len());
        for table in tables {
            let Some(date_raw) = self.find_date_before(table) else {
                continue;
            };

            let mut rec = RawRecord::new(date_raw);
            for tier in MB_TIERS {
                rec.set(tier, "");
            }

            for row in table.select(&self.row_sel) {
                let cells: Vec<ElementRef> = row.select(&self.cell_sel).collect();
                if cells.is_empty() {
                    continue;
                }
                let label = full_text(&cells[0]).to_lowercase();
                // The special-prize code row is not a tier.
                if label.contains("mã") && label.contains("đb") {
                    continue;
                }
                let numbers = self.numbers_from_row(&row, &cells);
                if numbers.is_empty() {
                    continue;
                }
                let joined = numbers.join(" ");
                match self.label_to_tier(&label) {
                    Some(tier) => rec.set(tier, joined),
                    None => {
                        // Unlabelled row: fill the first still-empty numbered tier.
                        for tier in &MB_TIERS[1..] {
                            if rec.get(tier).is_some_and(str::is_empty) {
                                rec.set(tier, joined);
                                break;
                            }
                        }
                    }
                }
            }

            if rec.get(MB_TIERS[0]).is_some_and(str::is_empty) {
                if let Some(span) = table.select(&self.special_fallback_sel).next() {
                    let nums = self.extract_digits(&full_text(&span));
                    if !nums.is_empty() {
                        rec.set(MB_TIERS[0], nums.join(" "));
                    }
                }
            }

            let all = dedup_tiers(&mut rec, &MB_TIERS);
            rec.set(COL_ALL, all);
            records.push(rec);
        }
        Ok(records)
    }

    /// Walk preceding siblings (climbing a few ancestor levels) looking for
    /// a `DD/MM/YYYY` date in anchor titles or heading text.
    fn find_date_before(&self, table: ElementRef) -> Option<String> {
        let mut node = *table;
        for _ in 0..4 {
            let mut inspected = 0;
            for sibling in node.prev_siblings() {
                let Some(el) = ElementRef::wrap(sibling) else {
                    continue;
                };
                if let Some(found) = self.date_in_element(&el) {
                    return Some(found);
                }
                inspected += 1;
                if inspected >= 8 {
                    break;
                }
            }
            node = node.parent()?;
        }
        None
    }

    fn date_in_element(&self, el: &ElementRef) -> Option<String> {
        if let Some(title) = el.value().attr("title") {
            if let Some(m) = self.date_re.find(title) {
                return Some(m.as_str().to_string());
            }
        }
        for link in el.select(&self.link_sel) {
            if let Some(title) = link.value().attr("title") {
                if let Some(m) = self.date_re.find(title) {
                    return Some(m.as_str().to_string());
                }
            }
        }
        self.date_re
            .find(&full_text(el))
            .map(|m| m.as_str().to_string())
    }

    /// Numbers come from the row's spans; rows without spans fall back to
    /// the cells after the label.
    fn numbers_from_row(&self, row: &ElementRef, cells: &[ElementRef]) -> Vec<String> {
        let mut numbers = Vec::new();
        for span in row.select(&self.span_sel) {
            numbers.extend(self.extract_digits(&full_text(&span)));
        }
        if !numbers.is_empty() {
            return numbers;
        }
        for cell in &cells[1..] {
            numbers.extend(self.extract_digits(&full_text(cell)));
        }
        numbers
    }

    fn extract_digits(&self, text: &str) -> Vec<String> {
        self.digits_re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn label_to_tier(&self, label: &str) -> Option<&'static str> {
        let normalized = self.label_ws_re.replace_all(label, " ").into_owned();
        if self.special_label_re.is_match(&normalized) {
            return Some(MB_TIERS[0]);
        }
        for (tier, re) in &self.tier_label_res {
            if re.is_match(&normalized) {
                return Some(tier);
            }
        }
        None
    }
}

#[async_trait]
impl Source for XsmbSource {
    fn region(&self) -> &str {
        "XSMB"
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
