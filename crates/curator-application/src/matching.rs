// SPDX-License-Identifier: GPL-3.0-or-later

//! Title matching between a loose query title and watchlist entries.
//!
//! Matching runs in two passes:
//! 1. Exact comparison of normalized titles (plus year when one is given)
//! 2. Bigram similarity fallback, accepted at [`FUZZY_MATCH_THRESHOLD`] or above

use curator_plex::WatchlistEntry;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Minimum similarity score for a fuzzy match to be trusted.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// How a candidate set was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedBy {
    None,
    Normalized,
    Fuzzy,
}

/// Entries selected for removal for one query title.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidateSet {
    pub entries: Vec<WatchlistEntry>,
    pub matched_by: MatchedBy,
}

impl MatchCandidateSet {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            matched_by: MatchedBy::None,
        }
    }
}

/// Lower-case `title` and keep only `[a-z0-9]`.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Dice coefficient over the bigrams of both normalized titles, in `[0, 1]`.
pub fn similarity_score(left: &str, right: &str) -> f64 {
    let left = normalize_title(left);
    let right = normalize_title(right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }
    if left.len() < 2 || right.len() < 2 {
        return 0.0;
    }

    let left_bigrams = bigram_counts(&left);
    let right_bigrams = bigram_counts(&right);
    let intersection: usize = left_bigrams
        .iter()
        .map(|(bigram, count)| {
            right_bigrams
                .get(bigram)
                .map_or(0, |other| (*count).min(*other))
        })
        .sum();

    let total = (left.len() - 1) + (right.len() - 1);
    (2 * intersection) as f64 / total as f64
}

// Normalized keys are ASCII, so byte windows are character bigrams.
fn bigram_counts(key: &str) -> HashMap<[u8; 2], usize> {
    let mut counts = HashMap::new();
    for window in key.as_bytes().windows(2) {
        *counts.entry([window[0], window[1]]).or_insert(0) += 1;
    }
    counts
}

/// Pick the entries a query title refers to.
///
/// A supplied `year` must equal the entry's year in both passes. The fuzzy
/// pass elects the single best-scoring entry (first one on ties) and gathers
/// every entry sharing its raw title, so duplicate listings go together.
/// Under a year filter the fuzzy pass never gathers an entry with another year.
pub fn select_candidates(
    entries: &[WatchlistEntry],
    title: &str,
    year: Option<i32>,
) -> MatchCandidateSet {
    let wanted = normalize_title(title);
    if wanted.is_empty() {
        return MatchCandidateSet::empty();
    }

    let eligible: Vec<&WatchlistEntry> = entries
        .iter()
        .filter(|entry| year.map_or(true, |year| entry.year == Some(year)))
        .collect();

    let exact: Vec<WatchlistEntry> = eligible
        .iter()
        .filter(|entry| normalize_title(&entry.title) == wanted)
        .map(|entry| (*entry).clone())
        .collect();
    if !exact.is_empty() {
        return MatchCandidateSet {
            entries: exact,
            matched_by: MatchedBy::Normalized,
        };
    }

    let mut best: Option<(&WatchlistEntry, f64)> = None;
    for entry in &eligible {
        let score = similarity_score(title, &entry.title);
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((*entry, score)),
        }
    }

    let Some((representative, score)) = best else {
        return MatchCandidateSet::empty();
    };

    if score < FUZZY_MATCH_THRESHOLD {
        debug!(
            target: "watchlist",
            query = title,
            best = %representative.title,
            score,
            "best fuzzy candidate below threshold"
        );
        return MatchCandidateSet::empty();
    }

    debug!(
        target: "watchlist",
        query = title,
        matched = %representative.title,
        score,
        "fuzzy match accepted"
    );

    MatchCandidateSet {
        entries: eligible
            .iter()
            .filter(|entry| entry.title == representative.title)
            .map(|entry| (*entry).clone())
            .collect(),
        matched_by: MatchedBy::Fuzzy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str, year: Option<i32>) -> WatchlistEntry {
        WatchlistEntry {
            external_id: id.to_string(),
            title: title.to_string(),
            year,
            kind: Some("movie".to_string()),
        }
    }

    #[test]
    fn normalize_ignores_case_spacing_and_punctuation() {
        assert_eq!(normalize_title("The Matrix!"), normalize_title("the   matrix"));
        assert_eq!(normalize_title("Spider-Man: No Way Home"), "spidermannowayhome");
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("Amélie"), "amlie");
    }

    #[test]
    fn score_is_symmetric() {
        let pairs = [
            ("The Avengers", "Avengers"),
            ("Heat", "The Heat"),
            ("Alien 3", "Aliens"),
            ("abab", "ab"),
        ];
        for (left, right) in pairs {
            assert_eq!(similarity_score(left, right), similarity_score(right, left));
        }
    }

    #[test]
    fn score_of_identical_titles_is_one() {
        assert_eq!(similarity_score("Inception", "Inception"), 1.0);
        assert_eq!(similarity_score("x", "X!"), 1.0);
    }

    #[test]
    fn degenerate_scores_are_zero() {
        assert_eq!(similarity_score("", "anything"), 0.0);
        assert_eq!(similarity_score("anything", "?!"), 0.0);
        assert_eq!(similarity_score("a", "ab"), 0.0);
    }

    #[test]
    fn score_counts_repeated_bigrams() {
        // "abab" -> {ab:2, ba:1}, "ab" -> {ab:1}; intersection 1 over 3 + 1 bigrams.
        assert_eq!(similarity_score("abab", "ab"), 0.5);
    }

    #[test]
    fn score_values_around_threshold() {
        assert!((similarity_score("The Avengers", "Avengers") - 14.0 / 17.0).abs() < 1e-12);
        assert_eq!(similarity_score("The Avenger", "Avengers"), 0.75);
        assert_eq!(similarity_score("Alien 3", "Alien 2"), 0.8);
        assert!(similarity_score("Inception", "Interstellar") < 0.5);
    }

    #[test]
    fn exact_pass_wins_and_respects_year() {
        let entries = vec![
            entry("1", "Dune", Some(1984)),
            entry("2", "Dune", Some(2021)),
            entry("3", "Dune: Part Two", Some(2024)),
        ];

        let any_year = select_candidates(&entries, "dune", None);
        assert_eq!(any_year.matched_by, MatchedBy::Normalized);
        assert_eq!(any_year.entries.len(), 2);

        let remake = select_candidates(&entries, "DUNE", Some(2021));
        assert_eq!(remake.matched_by, MatchedBy::Normalized);
        assert_eq!(remake.entries, vec![entry("2", "Dune", Some(2021))]);
    }

    #[test]
    fn fuzzy_pass_gathers_same_raw_title() {
        let entries = vec![
            entry("1", "The Avengers", Some(2012)),
            entry("2", "Avengers: Endgame", Some(2019)),
            entry("3", "The Avengers", Some(2012)),
            entry("4", "The Avengers!", Some(2012)),
        ];

        let set = select_candidates(&entries, "Avengers", None);
        assert_eq!(set.matched_by, MatchedBy::Fuzzy);
        let ids: Vec<&str> = set.entries.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn fuzzy_pass_under_year_filter_skips_other_years() {
        let entries = vec![
            entry("1", "The Avengers", Some(1998)),
            entry("2", "The Avengers", Some(2012)),
            entry("3", "The Avengers", Some(2012)),
        ];

        let set = select_candidates(&entries, "Avengers", Some(2012));
        assert_eq!(set.matched_by, MatchedBy::Fuzzy);
        let ids: Vec<&str> = set.entries.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn fuzzy_threshold_is_inclusive() {
        let entries = vec![entry("1", "Alien 2", None)];
        let set = select_candidates(&entries, "Alien 3", None);
        assert_eq!(set.matched_by, MatchedBy::Fuzzy);
        assert_eq!(set.entries.len(), 1);
    }

    #[test]
    fn below_threshold_selects_nothing() {
        let entries = vec![entry("1", "The Avenger", None)];
        let set = select_candidates(&entries, "Avengers", None);
        assert_eq!(set, MatchCandidateSet::empty());
    }

    #[test]
    fn empty_watchlist_or_blank_query_selects_nothing() {
        assert_eq!(select_candidates(&[], "Heat", None).matched_by, MatchedBy::None);

        let entries = vec![entry("1", "Heat", None)];
        assert_eq!(select_candidates(&entries, "...", None).matched_by, MatchedBy::None);
    }
}
