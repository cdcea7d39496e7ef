use crate::domain::model::RawRecord;
use std::collections::HashSet;

/// Remove numbers already claimed by a higher-priority tier.
///
/// Tiers are processed in the order given, first tier wins a duplicate.
/// Returns the combined list: the surviving numbers of every tier joined in
/// that same order. The result is deterministic for a given record and
/// tier order.
pub fn dedup_tiers(record: &mut RawRecord, tiers_by_priority: &[&str]) -> String {
    let mut used: HashSet<String> = HashSet::new();
    let mut all: Vec<String> = Vec::new();

    for tier in tiers_by_priority {
        let Some(value) = record.get(tier).map(str::to_string) else {
            continue;
        };
        let kept: Vec<&str> = value
            .split_whitespace()
            .filter(|n| !used.contains(*n))
            .collect();
        for n in &kept {
            used.insert((*n).to_string());
            all.push((*n).to_string());
        }
        record.set(tier, kept.join(" "));
    }

    all.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priority_tier_keeps_the_duplicate() {
        let mut rec = RawRecord::new("01/01/2024");
        rec.set("A", "12 34");
        rec.set("B", "34 56");

        // B outranks A, so B keeps 34 and A loses it.
        let all = dedup_tiers(&mut rec, &["B", "A"]);

        assert_eq!(rec.get("B"), Some("34 56"));
        assert_eq!(rec.get("A"), Some("12"));
        assert_eq!(all, "34 56 12");
    }

    #[test]
    fn duplicates_within_run_collapse_once() {
        let mut rec = RawRecord::new("01/01/2024");
        rec.set("Giải ĐB", "12345");
        rec.set("Giải 1", "12345 678");
        rec.set("Giải 7", "99 99");

        let all = dedup_tiers(&mut rec, &["Giải ĐB", "Giải 1", "Giải 7"]);

        assert_eq!(rec.get("Giải ĐB"), Some("12345"));
        assert_eq!(rec.get("Giải 1"), Some("678"));
        assert_eq!(rec.get("Giải 7"), Some("99"));
        assert_eq!(all, "12345 678 99");
    }

    #[test]
    fn missing_and_empty_tiers_are_harmless() {
        let mut rec = RawRecord::new("01/01/2024");
        rec.set("Giải 1", "");

        let all = dedup_tiers(&mut rec, &["Giải ĐB", "Giải 1"]);
        assert_eq!(all, "");
        assert_eq!(rec.get("Giải 1"), Some(""));
    }
}
