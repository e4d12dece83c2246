//! Query normalization and coarse intent flags.
//!
//! Pure functions only. The flags are not exclusive: a query may be an info
//! query and a planner request at the same time, and the dispatcher decides
//! what to do with the combination.

use unicode_normalization::UnicodeNormalization;

/// Prefix the suggestion chips put in front of a recommended query.
pub const RECOMMENDATION_MARKER: &str = "[Recommended]";

const QUESTION_WORDS: &[&str] = &[
    "what", "who", "when", "where", "why", "how", "which", "is", "are", "does", "do", "can",
];

const INFO_MARKERS: &[&str] = &[
    "tell me",
    "details",
    "info",
    "information",
    "status of",
    "update on",
    "about",
    "explain",
];

const SUMMARY_MARKERS: &[&str] = &[
    "summary",
    "summarize",
    "summarise",
    "overview",
    "brief me",
    "briefing",
    "recap",
    "highlights",
    "agenda",
    "today's",
    "my day",
];

const PLANNER_MARKERS: &[&str] = &[
    "plan",
    "planner",
    "to-do",
    "todo",
    "checklist",
    "action items",
    "next steps",
    "what should i do",
    "prepare",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub clean_query: String,
    pub is_recommendation: bool,
}

/// Strip the recommendation marker and tidy the query text.
pub fn normalize(query: &str) -> NormalizedQuery {
    let composed: String = query.nfkc().collect();
    let trimmed = composed.trim();

    let marker_len = RECOMMENDATION_MARKER.len();
    let is_recommendation = trimmed.len() >= marker_len
        && trimmed.is_char_boundary(marker_len)
        && trimmed[..marker_len].eq_ignore_ascii_case(RECOMMENDATION_MARKER);

    let rest = if is_recommendation {
        &trimmed[marker_len..]
    } else {
        trimmed
    };

    NormalizedQuery {
        clean_query: collapse_whitespace(rest),
        is_recommendation,
    }
}

/// Lower-cased, whitespace-collapsed form every trigger test runs against.
pub fn fold(query: &str) -> String {
    collapse_whitespace(&query.nfkc().collect::<String>()).to_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `word` appears as a whole word (alphanumeric run) in `haystack`.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
        .any(|w| w == word)
}

/// Single words match whole words; phrases match as substrings.
pub fn mentions(haystack: &str, needle: &str) -> bool {
    if needle.contains(' ') || needle.contains('\'') {
        haystack.contains(needle)
    } else {
        contains_word(haystack, needle)
    }
}

pub fn mentions_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| mentions(haystack, n))
}

/// Coarse intent flags for a folded query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub info: bool,
    pub summary: bool,
    pub planner: bool,
    pub pure_question: bool,
}

impl QueryFlags {
    pub fn classify(query: &str) -> Self {
        let q = fold(query);
        let planner = is_planner_request(&q);
        let summary = is_summary_query(&q);
        QueryFlags {
            info: is_info_query(&q),
            summary,
            planner,
            pure_question: is_question(&q) && !planner && !summary,
        }
    }

    pub fn any(&self) -> bool {
        self.info || self.summary || self.planner || self.pure_question
    }
}

pub fn is_info_query(query: &str) -> bool {
    let q = fold(query);
    is_question(&q) || mentions_any(&q, INFO_MARKERS)
}

pub fn is_summary_query(query: &str) -> bool {
    mentions_any(&fold(query), SUMMARY_MARKERS)
}

pub fn is_planner_request(query: &str) -> bool {
    mentions_any(&fold(query), PLANNER_MARKERS)
}

fn is_question(q: &str) -> bool {
    if q.ends_with('?') {
        return true;
    }
    q.split_whitespace()
        .next()
        .map(|first| QUESTION_WORDS.contains(&first.trim_end_matches('?')))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_marker() {
        let n = normalize("[Recommended]   Show pending approvals");
        assert!(n.is_recommendation);
        assert_eq!(n.clean_query, "Show pending approvals");
    }

    #[test]
    fn test_normalize_marker_case_insensitive() {
        let n = normalize("[recommended] brief me");
        assert!(n.is_recommendation);
        assert_eq!(n.clean_query, "brief me");
    }

    #[test]
    fn test_normalize_plain_query() {
        let n = normalize("  Show   pending approvals ");
        assert!(!n.is_recommendation);
        assert_eq!(n.clean_query, "Show pending approvals");
    }

    #[test]
    fn test_normalize_short_and_multibyte_input() {
        assert!(!normalize("[Rec").is_recommendation);
        assert!(!normalize("पूजा समय").is_recommendation);
    }

    #[test]
    fn test_whole_word_matching() {
        assert!(contains_word("add flowers to plan", "plan"));
        assert!(!contains_word("explain the festival", "plan"));
        assert!(mentions("what should i do today", "what should i do"));
    }

    #[test]
    fn test_flags_overlap() {
        let flags = QueryFlags::classify("What is the plan for today?");
        assert!(flags.info);
        assert!(flags.planner);
        assert!(!flags.pure_question);
    }

    #[test]
    fn test_pure_question() {
        let flags = QueryFlags::classify("Who is the temple priest on duty?");
        assert!(flags.pure_question);
        assert!(flags.info);
    }

    #[test]
    fn test_unmatched_query_has_no_flags() {
        let flags = QueryFlags::classify("flowers");
        assert!(!flags.any());
    }

    #[test]
    fn test_summary_flag() {
        assert!(is_summary_query("Give me today's overview"));
        assert!(!is_summary_query("add buy flowers to plan"));
    }
}
