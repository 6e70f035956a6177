//! Date-phrase parsing and card matching
//!
//! Report dates show up in cards in whatever format their author picked
//! ("2 November 2025", "Nov 2, 2025", "02/11/2025", "2025-11-02", Arabic month
//! names...) and without a stable attribute to key on. Matching therefore
//! parses the spoken phrase into a calendar date once, then scans cards with
//! a set of patterns covering the usual written forms.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use page_dom::{Document, NodeId};
use regex::Regex;
use tracing::debug;

use crate::errors::LocatorError;

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Accepted abbreviations per month (regex alternatives, longest first)
const ENGLISH_ABBREVIATIONS: [&[&str]; 12] = [
    &["Jan"],
    &["Feb"],
    &["Mar"],
    &["Apr"],
    &["May"],
    &["Jun"],
    &["Jul"],
    &["Aug"],
    &["Sept", "Sep"],
    &["Oct"],
    &["Nov"],
    &["Dec"],
];

/// Arabic month names, with and without hamza
const ARABIC_MONTHS: [&[&str]; 12] = [
    &["يناير"],
    &["فبراير"],
    &["مارس"],
    &["أبريل", "إبريل", "ابريل"],
    &["مايو"],
    &["يونيو", "يونيه"],
    &["يوليو", "يوليه"],
    &["أغسطس", "اغسطس"],
    &["سبتمبر"],
    &["أكتوبر", "اكتوبر"],
    &["نوفمبر"],
    &["ديسمبر"],
];

const NATIVE_FORMATS: [&str; 14] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%B %d,%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
    "%a %b %d %Y",
    "%a, %d %b %Y",
    "%d-%b-%Y",
    "%b-%d-%Y",
];

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("static regex"));

static DATE_LIKE: Lazy<Regex> = Lazy::new(|| {
    let months = ENGLISH_MONTHS
        .iter()
        .map(|m| m.to_string())
        .chain(
            ENGLISH_ABBREVIATIONS
                .iter()
                .flat_map(|alts| alts.iter().map(|a| format!(r"{a}\.?"))),
        )
        .chain(
            ARABIC_MONTHS
                .iter()
                .flat_map(|alts| alts.iter().map(|a| a.to_string())),
        )
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i)\b(?:\d{{4}}-\d{{1,2}}-\d{{1,2}}|\d{{1,2}}[/-]\d{{1,2}}[/-]\d{{4}}|\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{months})\s*,?\s+\d{{4}}|(?:{months})\s+\d{{1,2}}(?:st|nd|rd|th)?\s*,?\s+\d{{4}})\b"
    );
    Regex::new(&pattern).expect("static regex")
});

/// Parse a loosely formatted date phrase into a calendar date.
///
/// Native formats are tried first; then any `<day> <month-name> <year>`
/// token triple using the English/Arabic month table.
pub fn parse_date_phrase(phrase: &str) -> Result<NaiveDate, LocatorError> {
    let normalized = normalize_phrase(phrase);
    if normalized.is_empty() {
        return Err(LocatorError::InvalidDatePhrase(phrase.to_string()));
    }
    if let Some(date) = parse_native(&normalized) {
        return Ok(date);
    }
    if let Some(date) = parse_tokens(&normalized) {
        return Ok(date);
    }
    Err(LocatorError::InvalidDatePhrase(phrase.to_string()))
}

fn normalize_phrase(phrase: &str) -> String {
    let western: String = phrase
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => {
                char::from_digit(c as u32 - 0x0660, 10).unwrap_or(c)
            }
            '\u{06F0}'..='\u{06F9}' => {
                char::from_digit(c as u32 - 0x06F0, 10).unwrap_or(c)
            }
            '\u{060C}' => ',',
            _ => c,
        })
        .collect();
    let stripped = ORDINAL_SUFFIX.replace_all(&western, "$1");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_native(phrase: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(phrase) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(phrase, format) {
            return Some(dt.date());
        }
    }
    NATIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(phrase, format).ok())
}

fn parse_tokens(phrase: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = phrase
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == ',' || c == '.'))
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("of"))
        .collect();
    tokens.windows(3).find_map(|window| {
        let day: u32 = window[0].parse().ok()?;
        let month = month_number(window[1])?;
        let year: i32 = window[2].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Month number (1-12) for an English (full or abbreviated) or Arabic name.
pub fn month_number(token: &str) -> Option<u32> {
    let lower = token.trim().trim_end_matches('.').to_lowercase();
    if lower.is_empty() {
        return None;
    }
    for (idx, full) in ENGLISH_MONTHS.iter().enumerate() {
        if full.to_lowercase() == lower {
            return Some(idx as u32 + 1);
        }
    }
    for (idx, alts) in ENGLISH_ABBREVIATIONS.iter().enumerate() {
        if alts.iter().any(|a| a.to_lowercase() == lower) {
            return Some(idx as u32 + 1);
        }
    }
    let bare = lower.strip_prefix("ال").unwrap_or(&lower);
    for (idx, alts) in ARABIC_MONTHS.iter().enumerate() {
        if alts.iter().any(|a| *a == lower || *a == bare) {
            return Some(idx as u32 + 1);
        }
    }
    None
}

/// Ordered regex set recognising one calendar date in common written forms.
#[derive(Debug, Clone)]
pub struct DatePatterns {
    date: NaiveDate,
    patterns: Vec<Regex>,
}

impl DatePatterns {
    pub fn for_date(date: NaiveDate) -> Result<Self, LocatorError> {
        let day = date.day();
        let month = date.month();
        let year = date.year();
        let idx = month as usize - 1;

        let d = format!("0?{day}");
        let m = format!("0?{month}");
        let ord = "(?:st|nd|rd|th)?";
        let full = ENGLISH_MONTHS[idx];
        let abbr = format!("(?:{})", ENGLISH_ABBREVIATIONS[idx].join("|"));
        let arabic = format!("(?:{})", ARABIC_MONTHS[idx].join("|"));

        let sources = [
            // 2 November 2025 / 2nd of November, 2025
            format!(r"(?i)\b{d}{ord}\s+(?:of\s+)?{full}\s*,?\s+{year}\b"),
            // November 2, 2025 / November 2 2025
            format!(r"(?i)\b{full}\s+{d}{ord}\s*,?\s+{year}\b"),
            // 2 Nov 2025 / 2 Nov. 2025
            format!(r"(?i)\b{d}{ord}\s+{abbr}\.?\s*,?\s+{year}\b"),
            // Nov 2, 2025
            format!(r"(?i)\b{abbr}\.?\s+{d}{ord}\s*,?\s+{year}\b"),
            // 02/11/2025, 2-11-2025
            format!(r"\b{d}[/-]{m}[/-]{year}\b"),
            // 11/02/2025, 11-2-2025
            format!(r"\b{m}[/-]{d}[/-]{year}\b"),
            // 2025-11-02
            format!(r"\b{year}[/-]{m}[/-]{d}\b"),
            // 2 نوفمبر 2025
            format!(r"\b{d}\s+(?:ال)?{arabic}\s*[,،]?\s+{year}\b"),
            // 2 November (no year)
            format!(r"(?i)\b{d}{ord}\s+(?:of\s+)?(?:{full}|{abbr}\.?)\b"),
            // November 2 (no year)
            format!(r"(?i)\b(?:{full}|{abbr}\.?)\s+{d}{ord}\b"),
        ];

        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| LocatorError::StrategyFailed {
                    strategy: "date".to_string(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { date, patterns })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Which part of a card carried the date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    FullText,
    ProminentLabel,
    DateElement,
    Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMatch {
    pub card: NodeId,
    pub date: NaiveDate,
    pub source: DateSource,
}

/// Find the rendered card whose content carries the date named by `phrase`.
///
/// Cards are elements whose class contains "card". When an outer container
/// and a card inside it both match, the innermost card wins.
pub fn find_card_by_date(doc: &Document, phrase: &str) -> Result<Option<CardMatch>, LocatorError> {
    let date = parse_date_phrase(phrase)?;
    let patterns = DatePatterns::for_date(date)?;

    let matching: Vec<(NodeId, DateSource)> = card_candidates(doc)
        .into_iter()
        .filter_map(|card| card_date_source(doc, card, &patterns).map(|source| (card, source)))
        .collect();

    debug!(
        phrase,
        %date,
        matches = matching.len(),
        "date card scan finished"
    );

    let innermost = matching.iter().find(|(card, _)| {
        !matching
            .iter()
            .any(|(other, _)| other != card && doc.contains(*card, *other))
    });
    Ok(innermost.map(|(card, source)| CardMatch {
        card: *card,
        date,
        source: *source,
    }))
}

fn card_candidates(doc: &Document) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|id| {
            doc.element(*id)
                .is_some_and(|element| element.class_contains("card"))
                && doc.is_rendered(*id)
        })
        .collect()
}

fn card_date_source(doc: &Document, card: NodeId, patterns: &DatePatterns) -> Option<DateSource> {
    if patterns.is_match(&doc.inner_text(card)) {
        return Some(DateSource::FullText);
    }

    let descendants = doc.descendants(card);

    if any_text_matches(doc, &descendants, patterns, |id| is_prominent_label(doc, id)) {
        return Some(DateSource::ProminentLabel);
    }

    let date_elements: Vec<NodeId> = descendants
        .iter()
        .copied()
        .filter(|id| is_date_element(doc, *id))
        .collect();
    if date_elements.iter().any(|id| {
        patterns.is_match(&doc.inner_text(*id))
            || doc
                .attr(*id, "datetime")
                .is_some_and(|value| datetime_attr_matches(value, patterns))
    }) {
        return Some(DateSource::DateElement);
    }

    if any_text_matches(doc, &descendants, patterns, |id| doc.tag(id) == Some("span")) {
        return Some(DateSource::Span);
    }
    None
}

fn any_text_matches(
    doc: &Document,
    nodes: &[NodeId],
    patterns: &DatePatterns,
    filter: impl Fn(NodeId) -> bool,
) -> bool {
    nodes
        .iter()
        .copied()
        .filter(|id| filter(*id))
        .any(|id| patterns.is_match(&doc.inner_text(id)))
}

fn datetime_attr_matches(value: &str, patterns: &DatePatterns) -> bool {
    patterns.is_match(value)
        || parse_date_phrase(value)
            .map(|parsed| parsed == patterns.date())
            .unwrap_or(false)
}

fn is_prominent_label(doc: &Document, id: NodeId) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    matches!(
        element.tag.as_str(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "b"
    ) || ["font-bold", "font-semibold", "title", "heading"]
        .iter()
        .any(|class| element.class_contains(class))
}

fn is_date_element(doc: &Document, id: NodeId) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    element.tag == "time"
        || element.has_attr("datetime")
        || element.class_contains("date")
        || element.class_contains("time")
}

/// First date-looking substring of `text`, used for card summaries.
pub fn extract_date_text(text: &str) -> Option<String> {
    DATE_LIKE.find(text).map(|m| m.as_str().to_string())
}
