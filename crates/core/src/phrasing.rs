//! Localised wording used when rendering summaries.
//!
//! A [`Phrasing`] holds every piece of natural-language text the engine injects on its own
//! (as opposed to text authored in templates):
//! - the chief-complaint prefix that opens a summary,
//! - the skip words that mark an option label as "not specified",
//! - the markers that identify an "other" option whose free text replaces its label,
//! - the words for time units appended to numeric answers.
//!
//! Presets exist for English and Thai. Deployments can override the preset with a YAML file.

use crate::session::TimeUnit;
use crate::{IntakeError, IntakeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Supported phrasing presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Thai,
}

impl FromStr for Locale {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "th" | "thai" => Ok(Locale::Thai),
            other => Err(IntakeError::InvalidInput(format!(
                "unsupported locale '{other}' (expected 'en' or 'th')"
            ))),
        }
    }
}

/// Words substituted for each time unit token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeUnitWords {
    pub minutes: String,
    pub hours: String,
    pub days: String,
    pub weeks: String,
    pub months: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Phrasing {
    pub chief_complaint_prefix: String,
    pub skip_words: Vec<String>,
    pub other_markers: Vec<String>,
    pub time_units: TimeUnitWords,
}

const THAI_SKIP_WORDS: &[&str] = &["ไม่ระบุ", "ไม่มี", "ไม่ทราบ", "ไม่เกี่ยวข้อง"];

impl Default for Phrasing {
    fn default() -> Self {
        Self::english()
    }
}

impl Phrasing {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::English => Self::english(),
            Locale::Thai => Self::thai(),
        }
    }

    /// English wording. Thai skip words stay active because option labels are often authored
    /// in Thai regardless of the summary language.
    pub fn english() -> Self {
        let mut skip_words: Vec<String> =
            ["not specified", "none", "unknown", "n/a", "not applicable"]
                .iter()
                .map(|w| w.to_string())
                .collect();
        skip_words.extend(THAI_SKIP_WORDS.iter().map(|w| w.to_string()));

        Self {
            chief_complaint_prefix: "Patient presents with".into(),
            skip_words,
            other_markers: vec!["other".into(), "อื่น".into()],
            time_units: TimeUnitWords {
                minutes: "minutes".into(),
                hours: "hours".into(),
                days: "days".into(),
                weeks: "weeks".into(),
                months: "months".into(),
            },
        }
    }

    pub fn thai() -> Self {
        let mut skip_words: Vec<String> = THAI_SKIP_WORDS.iter().map(|w| w.to_string()).collect();
        skip_words.extend(["unknown", "none", "n/a"].iter().map(|w| w.to_string()));

        Self {
            chief_complaint_prefix: "ผู้ป่วยมาด้วยอาการ".into(),
            skip_words,
            other_markers: vec!["อื่น".into(), "other".into()],
            time_units: TimeUnitWords {
                minutes: "นาที".into(),
                hours: "ชั่วโมง".into(),
                days: "วัน".into(),
                weeks: "สัปดาห์".into(),
                months: "เดือน".into(),
            },
        }
    }

    /// Parse a phrasing override from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DefinitionSchema`] naming the failing field when the YAML does
    /// not match the phrasing schema.
    pub fn from_yaml_str(yaml_text: &str, source_name: &str) -> IntakeResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize::<_, Phrasing>(deserializer).map_err(|err| {
            let path = err.path().to_string();
            IntakeError::DefinitionSchema {
                source_name: source_name.to_string(),
                path: if path.is_empty() || path == "." { "<root>".into() } else { path },
                message: err.into_inner().to_string(),
            }
        })
    }

    /// Load a phrasing override from a YAML file.
    pub fn load(path: &Path) -> IntakeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(IntakeError::FileRead)?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// Returns the first skip word contained in `text`, compared case-insensitively.
    pub fn matching_skip_word(&self, text: &str) -> Option<&str> {
        let folded = text.to_lowercase();
        self.skip_words
            .iter()
            .filter(|w| !w.trim().is_empty())
            .find(|w| folded.contains(&w.to_lowercase()))
            .map(String::as_str)
    }

    /// True when an option label denotes an "other, please specify" choice.
    pub fn is_other_label(&self, label: &str) -> bool {
        let folded = label.to_lowercase();
        self.other_markers
            .iter()
            .filter(|m| !m.trim().is_empty())
            .any(|m| folded.contains(&m.to_lowercase()))
    }

    pub fn time_unit_word(&self, unit: TimeUnit) -> &str {
        match unit {
            TimeUnit::Minutes => &self.time_units.minutes,
            TimeUnit::Hours => &self.time_units.hours,
            TimeUnit::Days => &self.time_units.days,
            TimeUnit::Weeks => &self.time_units.weeks,
            TimeUnit::Months => &self.time_units.months,
        }
    }
}

/// Resolve the phrasing from optional configuration values.
///
/// `override_file` wins over `locale`; with neither, the English preset is used.
pub fn phrasing_from_env_values(
    locale: Option<String>,
    override_file: Option<&Path>,
) -> IntakeResult<Phrasing> {
    if let Some(path) = override_file {
        return Phrasing::load(path);
    }

    let locale = locale
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<Locale>())
        .transpose()?
        .unwrap_or_default();

    Ok(Phrasing::for_locale(locale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_words_match_case_insensitively() {
        let phrasing = Phrasing::english();
        assert_eq!(phrasing.matching_skip_word("Unknown cause"), Some("unknown"));
        assert_eq!(phrasing.matching_skip_word("N/A"), Some("n/a"));
        assert_eq!(phrasing.matching_skip_word("ไม่ระบุ"), Some("ไม่ระบุ"));
        assert_eq!(phrasing.matching_skip_word("Dry cough"), None);
    }

    #[test]
    fn other_markers_detect_other_labels() {
        let phrasing = Phrasing::thai();
        assert!(phrasing.is_other_label("อื่นๆ (โปรดระบุ)"));
        assert!(phrasing.is_other_label("Other"));
        assert!(!phrasing.is_other_label("Penicillin"));
    }

    #[test]
    fn time_unit_words_follow_locale() {
        assert_eq!(Phrasing::english().time_unit_word(TimeUnit::Days), "days");
        assert_eq!(Phrasing::thai().time_unit_word(TimeUnit::Weeks), "สัปดาห์");
    }

    #[test]
    fn locale_parses_short_and_long_names() {
        assert_eq!("th".parse::<Locale>().unwrap(), Locale::Thai);
        assert_eq!("English".parse::<Locale>().unwrap(), Locale::English);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn from_env_values_defaults_to_english() {
        let phrasing = phrasing_from_env_values(None, None).unwrap();
        assert_eq!(phrasing.chief_complaint_prefix, "Patient presents with");

        let phrasing = phrasing_from_env_values(Some("  ".into()), None).unwrap();
        assert_eq!(phrasing, Phrasing::english());

        let phrasing = phrasing_from_env_values(Some("th".into()), None).unwrap();
        assert_eq!(phrasing, Phrasing::thai());
    }

    #[test]
    fn yaml_override_reports_schema_path() {
        let yaml = r#"chiefComplaintPrefix: "Presenting with"
skipWords: [none]
otherMarkers: [other]
timeUnits:
  minutes: min
  hours: h
  days: d
  weeks: wk
  month: mo
"#;
        let err = Phrasing::from_yaml_str(yaml, "phrasing.yaml").expect_err("typo in field");
        assert!(
            matches!(
                err,
                IntakeError::DefinitionSchema { ref path, .. } if path.starts_with("timeUnits")
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn yaml_override_parses() {
        let yaml = r#"chiefComplaintPrefix: "Presenting with"
skipWords: [none]
otherMarkers: [other]
timeUnits:
  minutes: min
  hours: h
  days: d
  weeks: wk
  months: mo
"#;
        let phrasing = Phrasing::from_yaml_str(yaml, "phrasing.yaml").expect("valid override");
        assert_eq!(phrasing.chief_complaint_prefix, "Presenting with");
        assert_eq!(phrasing.time_unit_word(TimeUnit::Months), "mo");
    }
}
