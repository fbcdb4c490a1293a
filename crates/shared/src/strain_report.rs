//! Extraction of the labelled strain-report fields from an assistant reply.
//!
//! Replies arrive as loosely formatted Markdown: fields may be written inline
//! (`Hybridization: Hybrid`), with bold labels (`**Lineage/Genetics:** ...`),
//! inside numbered lists, or as a label followed by bullet lines. Values of
//! "Unknown" are treated as absent.

use regex::Regex;
use std::sync::LazyLock;

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<label>[^:]{2,80}):\s*(?P<value>.*)$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    StrainName,
    AltNames,
    Nicknames,
    Hybridization,
    Lineage,
    Trivia,
    Flavors,
    Effects,
    Availability,
    Awards,
    ReleaseDate,
    PhysicalCharacteristics,
    SimilarStrains,
    UserRating,
}

impl ReportField {
    pub const ALL: [ReportField; 14] = [
        ReportField::StrainName,
        ReportField::AltNames,
        ReportField::Nicknames,
        ReportField::Hybridization,
        ReportField::Lineage,
        ReportField::Trivia,
        ReportField::Flavors,
        ReportField::Effects,
        ReportField::Availability,
        ReportField::Awards,
        ReportField::ReleaseDate,
        ReportField::PhysicalCharacteristics,
        ReportField::SimilarStrains,
        ReportField::UserRating,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportField::StrainName => "Strain Name",
            ReportField::AltNames => "Alt Name(s)",
            ReportField::Nicknames => "Nickname(s)",
            ReportField::Hybridization => "Hybridization",
            ReportField::Lineage => "Lineage / Genetics",
            ReportField::Trivia => "Trivia",
            ReportField::Flavors => "Reported Flavors",
            ReportField::Effects => "Reported Effects",
            ReportField::Availability => "Availability by State",
            ReportField::Awards => "Awards",
            ReportField::ReleaseDate => "Original Release Date",
            ReportField::PhysicalCharacteristics => "Physical Characteristics",
            ReportField::SimilarStrains => "Similar Strains",
            ReportField::UserRating => "User Rating",
        }
    }

    /// Inline values of these fields are comma-separated lists.
    fn splits_on_commas(&self) -> bool {
        matches!(
            self,
            ReportField::AltNames
                | ReportField::Nicknames
                | ReportField::Availability
                | ReportField::Awards
        )
    }

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        let label = label.split('(').next().unwrap_or_default().trim();
        let field = if label == "name" || label.starts_with("strain name") {
            ReportField::StrainName
        } else if label.starts_with("alt name") {
            ReportField::AltNames
        } else if label.starts_with("nickname") {
            ReportField::Nicknames
        } else if label.starts_with("hybridization") {
            ReportField::Hybridization
        } else if label.starts_with("lineage") {
            ReportField::Lineage
        } else if label.starts_with("trivia") {
            ReportField::Trivia
        } else if label.starts_with("reported flavors") || label == "flavors" {
            ReportField::Flavors
        } else if label.starts_with("reported effects") || label == "effects" {
            ReportField::Effects
        } else if label.starts_with("availability") {
            ReportField::Availability
        } else if label.starts_with("awards") {
            ReportField::Awards
        } else if label.starts_with("original release date") || label == "release date" {
            ReportField::ReleaseDate
        } else if label.starts_with("physical characteristics") {
            ReportField::PhysicalCharacteristics
        } else if label.starts_with("similar strains") {
            ReportField::SimilarStrains
        } else if label.starts_with("user rating") {
            ReportField::UserRating
        } else {
            return None;
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(t) => vec![t.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrainReport {
    entries: Vec<(ReportField, FieldValue)>,
}

impl StrainReport {
    pub fn parse(text: &str) -> Self {
        let mut report = StrainReport::default();
        // Field currently collecting bullet lines.
        let mut open: Option<(ReportField, Vec<String>)> = None;

        for raw in text.lines() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || is_separator(trimmed) {
                continue;
            }

            let body = strip_bullet(trimmed);
            let is_item = body.len() != trimmed.len() || NUMBERED_RE.is_match(trimmed);
            let line = clean_markdown(body);
            if line.is_empty() {
                continue;
            }

            if let Some((field, value)) = split_label(&line) {
                report.close(open.take());
                if value.is_empty() {
                    open = Some((field, Vec::new()));
                } else if let Some(value) = inline_value(field, &value) {
                    report.push(field, value);
                }
                continue;
            }

            if !is_item {
                // Prose after a list ends it.
                report.close(open.take());
                continue;
            }
            if let Some((_, items)) = open.as_mut() {
                if !is_unknown(&line) {
                    items.push(line);
                }
            }
        }
        report.close(open);
        report
    }

    pub fn get(&self, field: ReportField) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    /// Fields in the order they appeared in the reply.
    pub fn fields(&self) -> impl Iterator<Item = (ReportField, &FieldValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replies carrying fewer fields are ordinary answers, not reports.
    pub fn looks_like_report(&self) -> bool {
        self.len() >= 3
    }

    /// Leading number of the user rating, e.g. `4.3` from "4.3 / 5 (135+ reviews)".
    pub fn rating_score(&self) -> Option<f32> {
        let value = self.get(ReportField::UserRating)?;
        value
            .items()
            .into_iter()
            .find_map(|item| NUMBER_RE.find(item))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn push(&mut self, field: ReportField, value: FieldValue) {
        if self.get(field).is_none() {
            self.entries.push((field, value));
        }
    }

    fn close(&mut self, open: Option<(ReportField, Vec<String>)>) {
        if let Some((field, items)) = open {
            if !items.is_empty() {
                self.push(field, FieldValue::List(items));
            }
        }
    }
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '-' || c == '=' || c == '*' || c == '_')
        || (line.starts_with("===") && line.ends_with("==="))
}

fn strip_bullet(line: &str) -> &str {
    ["- ", "• ", "* "]
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .map(str::trim)
        .unwrap_or(line)
}

/// Remove emphasis markers, citation markers like `[1]`, list numbering and
/// heading hashes.
pub fn clean_markdown(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1");
    let text = CITATION_RE.replace_all(&text, "");
    let text = NUMBERED_RE.replace(text.trim(), "");
    text.trim_start_matches('#').trim().to_string()
}

fn split_label(line: &str) -> Option<(ReportField, String)> {
    let caps = LABEL_RE.captures(line)?;
    let field = ReportField::from_label(&caps["label"])?;
    Some((field, caps["value"].trim().to_string()))
}

fn inline_value(field: ReportField, value: &str) -> Option<FieldValue> {
    if field.splits_on_commas() {
        let items: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && !is_unknown(s))
            .collect();
        (!items.is_empty()).then_some(FieldValue::List(items))
    } else {
        (!is_unknown(value)).then(|| FieldValue::Text(value.to_string()))
    }
}

fn is_unknown(value: &str) -> bool {
    let v = value.trim().trim_end_matches('.').to_lowercase();
    v == "unknown" || v.starts_with("unknown (")
}
