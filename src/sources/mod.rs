pub mod daily;
pub mod southern;
pub mod xsmb;

use scraper::{ElementRef, Selector};

pub use daily::DailySource;
pub use southern::SouthernSource;
pub use xsmb::XsmbSource;

/// `DD/MM/YYYY` as printed on every known result page.
pub(crate) const DMY_PATTERN: &str = r"\d{2}/\d{2}/\d{4}";

/// Static CSS selectors only; a bad pattern is a programming error.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Whitespace-normalized text of an element and its descendants.
pub(crate) fn full_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text with one entry per text node, the shape the southern block regexes
/// run over.
pub(crate) fn line_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
