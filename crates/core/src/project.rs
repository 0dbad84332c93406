//! Project content rules: field limits, tag normalization, defaults.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Thumbnail color used when a submission does not pick one.
pub const DEFAULT_THUMBNAIL: &str = "#2F80ED";

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 40;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// How far along the project itself is (unrelated to review state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    pub fn from_str_value(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(ProgressStatus::InProgress),
            "completed" => Some(ProgressStatus::Completed),
            _ => None,
        }
    }
}

impl TryFrom<String> for ProgressStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_value(&value)
            .ok_or_else(|| CoreError::Internal(format!("Unknown progress value '{value}'")))
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Project content as submitted by a client on create or edit.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub summary: String,
    #[validate(length(min = 1, max = 120))]
    pub department: String,
    #[validate(length(min = 1, max = 120))]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub demo_link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(min = 1990, max = 2100))]
    pub year: Option<i32>,
    #[serde(default)]
    pub progress: ProgressStatus,
}

/// Normalized, validated project content ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContent {
    pub title: String,
    pub summary: String,
    pub department: String,
    pub category: String,
    /// Distinct tags in first-seen order.
    pub tags: Vec<String>,
    pub demo_link: Option<String>,
    pub thumbnail: String,
    pub completion_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub progress: ProgressStatus,
}

impl ProjectDraft {
    /// Trim, check limits, and apply defaults.
    pub fn into_content(self) -> Result<ProjectContent, CoreError> {
        let draft = ProjectDraft {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            department: self.department.trim().to_string(),
            category: self.category.trim().to_string(),
            ..self
        };
        draft.validate()?;

        let tags = normalize_tags(&draft.tags)?;
        let demo_link = validate_demo_link(draft.demo_link.as_deref())?;
        let thumbnail = validate_thumbnail(draft.thumbnail.as_deref())?;

        Ok(ProjectContent {
            title: draft.title,
            summary: draft.summary,
            department: draft.department,
            category: draft.category,
            tags,
            demo_link,
            thumbnail,
            completion_date: draft.completion_date,
            year: draft.year,
            progress: draft.progress,
        })
    }
}

/// Trim tags, drop blanks, and remove case-insensitive duplicates while
/// keeping the first spelling seen.
pub fn normalize_tags(raw: &[String]) -> Result<Vec<String>, CoreError> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(CoreError::Validation(format!(
                "Tag '{tag}' exceeds maximum length of {MAX_TAG_LENGTH} characters"
            )));
        }
        let key = tag.to_lowercase();
        if !tags.iter().any(|t| t.to_lowercase() == key) {
            tags.push(tag.to_string());
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(tags)
}

fn validate_demo_link(link: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(link) = link.map(str::trim).filter(|l| !l.is_empty()) else {
        return Ok(None);
    };
    if !(link.starts_with("http://") || link.starts_with("https://")) {
        return Err(CoreError::Validation(
            "Demo link must start with http:// or https://".into(),
        ));
    }
    Ok(Some(link.to_string()))
}

fn validate_thumbnail(thumbnail: Option<&str>) -> Result<String, CoreError> {
    match thumbnail.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(DEFAULT_THUMBNAIL.to_string()),
        Some(color) if COLOR_RE.is_match(color) => Ok(color.to_uppercase()),
        Some(color) => Err(CoreError::Validation(format!(
            "Thumbnail '{color}' must be a color in #RRGGBB form"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn draft() -> ProjectDraft {
        ProjectDraft {
            title: "  FoodWaste Detector ".into(),
            summary: "Detects food waste in the canteen.".into(),
            department: "Informatics".into(),
            category: "Machine Learning".into(),
            tags: vec![],
            demo_link: None,
            thumbnail: None,
            completion_date: None,
            year: Some(2025),
            progress: ProgressStatus::InProgress,
        }
    }

    #[test]
    fn trims_and_defaults() {
        let content = draft().into_content().unwrap();
        assert_eq!(content.title, "FoodWaste Detector");
        assert_eq!(content.thumbnail, DEFAULT_THUMBNAIL);
        assert_eq!(content.demo_link, None);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut d = draft();
        d.title = "   ".into();
        assert_matches!(d.into_content(), Err(CoreError::Validation(msg)) if msg.contains("title"));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut d = draft();
        d.title = "a".repeat(201);
        assert_matches!(d.into_content(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn year_out_of_range_is_rejected() {
        let mut d = draft();
        d.year = Some(1889);
        assert_matches!(d.into_content(), Err(CoreError::Validation(msg)) if msg.contains("year"));
    }

    #[test]
    fn tags_are_deduplicated_case_insensitively() {
        let tags = normalize_tags(&[
            "IoT".to_string(),
            " iot ".to_string(),
            "".to_string(),
            "Sensors".to_string(),
        ])
        .unwrap();
        assert_eq!(tags, vec!["IoT", "Sensors"]);
    }

    #[test]
    fn too_many_tags_rejected() {
        let raw: Vec<String> = (0..11).map(|i| format!("tag{i}")).collect();
        assert_matches!(normalize_tags(&raw), Err(CoreError::Validation(_)));
    }

    #[test]
    fn demo_link_requires_http_scheme() {
        let mut d = draft();
        d.demo_link = Some("ftp://example.com".into());
        assert_matches!(d.into_content(), Err(CoreError::Validation(_)));

        let mut d = draft();
        d.demo_link = Some(" https://demo.kampus.ac.id ".into());
        assert_eq!(
            d.into_content().unwrap().demo_link.as_deref(),
            Some("https://demo.kampus.ac.id")
        );
    }

    #[test]
    fn thumbnail_must_be_hex_color() {
        let mut d = draft();
        d.thumbnail = Some("#27ae60".into());
        assert_eq!(d.into_content().unwrap().thumbnail, "#27AE60");

        let mut d = draft();
        d.thumbnail = Some("green".into());
        assert_matches!(d.into_content(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn progress_names_round_trip() {
        for p in [ProgressStatus::InProgress, ProgressStatus::Completed] {
            assert_eq!(ProgressStatus::from_str_value(p.as_str()), Some(p));
        }
    }
}
