//! Output filename derivation.
//!
//! Reports carry their date in the first lines of page one, in one of a few
//! Korean formats. The title comes from the uploaded file's name with every
//! date form removed. The result looks like `2024.10.18.(금) - 저녁시그널`.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};

/// Only this many leading lines of page one are searched for a date.
pub const DATE_SEARCH_LINES: usize = 15;

/// Weekday names indexed by days from Sunday.
const WEEKDAYS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// Date and title before they are joined into one name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameResult {
    pub date: Option<String>,
    pub title: Option<String>,
}

impl FilenameResult {
    /// `"{date} - {title}"`, or whichever part exists.
    pub fn join(&self) -> Option<String> {
        match (&self.date, &self.title) {
            (Some(date), Some(title)) => Some(format!("{date} - {title}")),
            (Some(date), None) => Some(date.clone()),
            (None, Some(title)) => Some(title.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DateShape {
    /// `2024.10.18.(금)`
    Dotted,
    /// `2024년 10월 18일 (금)`
    Korean,
    /// `241018(금)`
    Compact,
    /// `10월 18일 (금)`, year taken from today
    MonthDay,
}

struct DateRule {
    shape: DateShape,
    re: Regex,
}

fn date_rules() -> &'static [DateRule] {
    static RULES: OnceLock<Vec<DateRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (
                DateShape::Dotted,
                r"([0-9]{4})\.([0-9]{1,2})\.([0-9]{1,2})\.?\s*\(([월화수목금토일])\)",
            ),
            (
                DateShape::Korean,
                r"([0-9]{4})년\s*([0-9]{1,2})월\s*([0-9]{1,2})일\s*\(?([월화수목금토일])\)?",
            ),
            (DateShape::Compact, r"([0-9]{2})([0-9]{2})([0-9]{2})\s*\(([월화수목금토일])\)"),
            (
                DateShape::MonthDay,
                r"([0-9]{1,2})월\s*([0-9]{1,2})일\s*\(?([월화수목금토일])\)?",
            ),
        ]
        .into_iter()
        .map(|(shape, pattern)| DateRule {
            shape,
            re: Regex::new(pattern).unwrap(),
        })
        .collect()
    })
}

fn title_strip_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            r"[0-9]{6}\s*\([월화수목금토일]\)\s*",
            r"[0-9]{4}\.[0-9]{1,2}\.[0-9]{1,2}\.?\s*\([월화수목금토일]\)\s*",
            r"[0-9]{4}년\s*[0-9]{1,2}월\s*[0-9]{1,2}일\s*\(?[월화수목금토일]\)?\s*",
            r"\[?\s*[0-9]{1,2}월\s*[0-9]{1,2}일\s*\(?[월화수목금토일]\)?\s*\]?\s*",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Copy markers added by file managers and editors: `(1)`, `(수정)`,
/// `(수정2)`, `(수정본)`, `(최종)`.
fn copy_marker_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            r"\s*\(수정[0-9]*\)",
            r"\s*\(수정본\)",
            r"\s*\(최종\)",
            r"\s*\([0-9]+\)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn pdf_extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.pdf$").unwrap())
}

fn format_date(year: &str, month: &str, day: &str, weekday: &str) -> String {
    format!("{year}.{month:0>2}.{day:0>2}.({weekday})")
}

fn date_from_captures(shape: DateShape, caps: &Captures, today: NaiveDate) -> String {
    match shape {
        DateShape::Dotted | DateShape::Korean => {
            format_date(&caps[1], &caps[2], &caps[3], &caps[4])
        }
        DateShape::Compact => format_date(&format!("20{}", &caps[1]), &caps[2], &caps[3], &caps[4]),
        DateShape::MonthDay => {
            format_date(&today.year().to_string(), &caps[1], &caps[2], &caps[3])
        }
    }
}

/// First date found in the leading lines of `text`.
///
/// Each line is tried against every rule before moving to the next line, so
/// an earlier line always wins over a more specific format further down.
pub fn date_from_text(text: &str, today: NaiveDate) -> Option<String> {
    text.split('\n')
        .take(DATE_SEARCH_LINES)
        .map(str::trim)
        .find_map(|line| {
            date_rules().iter().find_map(|rule| {
                rule.re
                    .captures(line)
                    .map(|caps| date_from_captures(rule.shape, &caps, today))
            })
        })
}

/// The `yymmdd(요일)` date embedded in a file name.
pub fn date_from_filename(name: &str) -> Option<String> {
    let rule = date_rules()
        .iter()
        .find(|r| matches!(r.shape, DateShape::Compact))?;
    let caps = rule.re.captures(name)?;
    Some(format_date(&format!("20{}", &caps[1]), &caps[2], &caps[3], &caps[4]))
}

/// `today` in the output date form, with its real weekday.
pub fn format_today(today: NaiveDate) -> String {
    let weekday = WEEKDAYS[today.weekday().num_days_from_sunday() as usize];
    format!(
        "{}.{:02}.{:02}.({})",
        today.year(),
        today.month(),
        today.day(),
        weekday
    )
}

/// Upper-case the first ASCII letter of each space-separated word and
/// lower-case the rest. Non-ASCII text is untouched.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::with_capacity(word.len());
                    out.push(first.to_ascii_uppercase());
                    out.extend(chars.map(|c| c.to_ascii_lowercase()));
                    out
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title from the original file name: extension and date forms removed,
/// surrounding hyphens and spaces trimmed, then title-cased.
pub fn title_from_filename(name: &str) -> Option<String> {
    static RE_EDGES: OnceLock<Regex> = OnceLock::new();
    let re_edges = RE_EDGES.get_or_init(|| Regex::new(r"^[\s\-]+|[\s\-]+$").unwrap());

    let mut title = pdf_extension_re().replace(name, "").to_string();
    for re in title_strip_rules() {
        title = re.replace_all(&title, "").to_string();
    }
    let title = re_edges.replace_all(&title, "");
    let title = title.trim();

    if title.is_empty() {
        None
    } else {
        Some(title_case(title))
    }
}

/// Date and title for a document.
pub fn derive(first_page_text: &str, original_name: &str, today: NaiveDate) -> FilenameResult {
    let date = date_from_text(first_page_text, today).or_else(|| date_from_filename(original_name));
    let title = title_from_filename(original_name);
    FilenameResult { date, title }
}

/// Strip copy markers and characters that are illegal in file names, then
/// collapse whitespace.
pub fn sanitize(name: &str) -> String {
    static RE_ILLEGAL: OnceLock<Regex> = OnceLock::new();
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_illegal = RE_ILLEGAL.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());

    let mut result = name.to_string();
    for re in copy_marker_rules() {
        result = re.replace_all(&result, "").to_string();
    }
    let result = re_illegal.replace_all(&result, "");
    re_spaces.replace_all(&result, " ").trim().to_string()
}

/// Final output name, without extension. Never empty.
pub fn generate(first_page_text: &str, original_name: &str, today: NaiveDate) -> String {
    let joined = derive(first_page_text, original_name, today)
        .join()
        .unwrap_or_else(|| format_today(today));

    let name = sanitize(&joined);
    if name.is_empty() {
        log::debug!("name for {original_name:?} sanitized to nothing, using today's date");
        format_today(today)
    } else {
        name
    }
}

/// Key under which two input files count as the same document.
pub fn dedupe_key(name: &str) -> String {
    let base = pdf_extension_re().replace(name, "");
    sanitize(&base).to_lowercase()
}

/// Split `names` into first occurrences and later duplicates, both in input
/// order.
pub fn partition_duplicates<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> (Vec<S>, Vec<S>) {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = Vec::new();

    for name in names {
        if seen.insert(dedupe_key(name.as_ref())) {
            unique.push(name);
        } else {
            duplicates.push(name);
        }
    }

    (unique, duplicates)
}
