// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

// ============================================================================
// Value Objects & IDs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormatId(pub Uuid);

impl FormatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for FormatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FormatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Test Case identity, unique within one custom format.
pub type TestCaseId = u32;

// ============================================================================
// Enums
// ============================================================================

/// Media-automation application a format or profile is scored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerApp {
    Radarr,
    Sonarr,
}

impl std::fmt::Display for ConsumerApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Radarr => write!(f, "radarr"),
            Self::Sonarr => write!(f, "sonarr"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cam,
    Telesync,
    Telecine,
    Workprint,
    Dvd,
    Tv,
    WebDl,
    WebRip,
    Bluray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "360p")]
    R360p,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "540p")]
    R540p,
    #[serde(rename = "576p")]
    R576p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "2160p")]
    R2160p,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::R360p => "360p",
            Self::R480p => "480p",
            Self::R540p => "540p",
            Self::R576p => "576p",
            Self::R720p => "720p",
            Self::R1080p => "1080p",
            Self::R2160p => "2160p",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityModifier {
    Regional,
    Screener,
    RawHd,
    BrDisk,
    Remux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    SingleEpisode,
    MultiEpisode,
    SeasonPack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerFlag {
    Freeleech,
    Halfleech,
    DoubleUpload,
    Internal,
    Scene,
    Freeleech75,
    Freeleech25,
    Nuked,
    PtpGolden,
    PtpApproved,
}

/// Unit attached to a size condition's bounds. Multiples are binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    #[default]
    Gigabytes,
}

impl SizeUnit {
    pub fn bytes_per_unit(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1024,
            Self::Megabytes => 1024 * 1024,
            Self::Gigabytes => 1024 * 1024 * 1024,
        }
    }

    /// Convert a (possibly fractional) amount of this unit to whole bytes.
    /// Negative and non-finite amounts clamp to zero.
    pub fn to_bytes(self, amount: f64) -> u64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        (amount * self.bytes_per_unit() as f64).round() as u64
    }
}

// ============================================================================
// Release Descriptor
// ============================================================================

/// Normalized facts about one candidate release, produced by a metadata
/// extractor and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDescriptor {
    pub title: String,
    pub release_group: String,
    pub edition: Option<String>,
    pub languages: BTreeSet<String>,
    pub indexer_flags: BTreeSet<IndexerFlag>,
    pub source: Option<Source>,
    pub resolution: Option<Resolution>,
    pub quality_modifier: Option<QualityModifier>,
    pub size_bytes: Option<u64>,
    pub year: Option<i32>,
    pub release_type: Option<ReleaseType>,
}

impl ReleaseDescriptor {
    /// A release known only by its title; every other field is empty.
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_release_group(mut self, group: impl Into<String>) -> Self {
        self.release_group = group.into();
        self
    }

    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    pub fn with_indexer_flag(mut self, flag: IndexerFlag) -> Self {
        self.indexer_flags.insert(flag);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_quality_modifier(mut self, modifier: QualityModifier) -> Self {
        self.quality_modifier = Some(modifier);
        self
    }

    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_release_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = Some(release_type);
        self
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Variant-specific payload of a condition. An unset discriminating value
/// (e.g. a source condition with no source chosen) never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionKind {
    ReleaseTitle {
        #[serde(default)]
        pattern: Option<String>,
    },
    ReleaseGroup {
        #[serde(default)]
        pattern: Option<String>,
    },
    Edition {
        #[serde(default)]
        pattern: Option<String>,
    },
    Language {
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        except_language: bool,
    },
    IndexerFlag {
        #[serde(default)]
        flag: Option<IndexerFlag>,
    },
    Source {
        #[serde(default)]
        source: Option<Source>,
    },
    Resolution {
        #[serde(default)]
        resolution: Option<Resolution>,
    },
    QualityModifier {
        #[serde(default)]
        modifier: Option<QualityModifier>,
    },
    ReleaseType {
        #[serde(default)]
        release_type: Option<ReleaseType>,
    },
    Size {
        #[serde(default)]
        min_size: Option<f64>,
        #[serde(default)]
        max_size: Option<f64>,
        #[serde(default)]
        unit: SizeUnit,
    },
    Year {
        #[serde(default)]
        min_year: Option<i32>,
        #[serde(default)]
        max_year: Option<i32>,
    },
}

impl ConditionKind {
    pub fn release_title(pattern: impl Into<String>) -> Self {
        Self::ReleaseTitle {
            pattern: Some(pattern.into()),
        }
    }

    pub fn release_group(pattern: impl Into<String>) -> Self {
        Self::ReleaseGroup {
            pattern: Some(pattern.into()),
        }
    }

    pub fn edition(pattern: impl Into<String>) -> Self {
        Self::Edition {
            pattern: Some(pattern.into()),
        }
    }

    pub fn language(language: impl Into<String>, except_language: bool) -> Self {
        Self::Language {
            language: Some(language.into()),
            except_language,
        }
    }

    pub fn source(source: Source) -> Self {
        Self::Source {
            source: Some(source),
        }
    }

    pub fn resolution(resolution: Resolution) -> Self {
        Self::Resolution {
            resolution: Some(resolution),
        }
    }

    pub fn year(min_year: Option<i32>, max_year: Option<i32>) -> Self {
        Self::Year { min_year, max_year }
    }

    pub fn size(min_size: Option<f64>, max_size: Option<f64>, unit: SizeUnit) -> Self {
        Self::Size {
            min_size,
            max_size,
            unit,
        }
    }

    /// Wire tag of this variant, used in logs and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ReleaseTitle { .. } => "release_title",
            Self::ReleaseGroup { .. } => "release_group",
            Self::Edition { .. } => "edition",
            Self::Language { .. } => "language",
            Self::IndexerFlag { .. } => "indexer_flag",
            Self::Source { .. } => "source",
            Self::Resolution { .. } => "resolution",
            Self::QualityModifier { .. } => "quality_modifier",
            Self::ReleaseType { .. } => "release_type",
            Self::Size { .. } => "size",
            Self::Year { .. } => "year",
        }
    }

    /// Pattern name for the pattern-based variants, if one is set.
    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Self::ReleaseTitle { pattern }
            | Self::ReleaseGroup { pattern }
            | Self::Edition { pattern } => pattern.as_deref().filter(|p| !p.trim().is_empty()),
            _ => None,
        }
    }

    pub fn is_title_pattern(&self) -> bool {
        matches!(self, Self::ReleaseTitle { .. })
    }
}

/// One atomic predicate over a release descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub negate: bool,
    #[serde(flatten)]
    pub kind: ConditionKind,
}

impl Condition {
    pub fn new(name: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            name: name.into(),
            required: false,
            negate: false,
            kind,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    /// The same condition with `negate` flipped.
    pub fn negated(&self) -> Self {
        let mut flipped = self.clone();
        flipped.negate = !self.negate;
        flipped
    }
}

// ============================================================================
// Custom Formats
// ============================================================================

/// Per-application enablement and base score of a custom format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatAppSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub score: i32,
}

fn default_enabled() -> bool {
    true
}

impl Default for FormatAppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            score: 0,
        }
    }
}

/// Stored authoring fixture. Results are recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub input: String,
    pub expected: bool,
}

/// A named, scored condition set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFormat {
    pub id: FormatId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub apps: BTreeMap<ConsumerApp, FormatAppSettings>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

impl CustomFormat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FormatId::new(),
            name: name.into(),
            description: String::new(),
            conditions: Vec::new(),
            tags: Vec::new(),
            apps: BTreeMap::new(),
            tests: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_app_score(mut self, app: ConsumerApp, score: i32) -> Self {
        self.apps.insert(app, FormatAppSettings { enabled: true, score });
        self
    }

    pub fn with_app_disabled(mut self, app: ConsumerApp) -> Self {
        self.apps.entry(app).or_default().enabled = false;
        self
    }

    /// Settings for `app`; a missing entry means enabled with score 0.
    pub fn app_settings(&self, app: ConsumerApp) -> FormatAppSettings {
        self.apps.get(&app).copied().unwrap_or_default()
    }

    /// Swap the condition at `index` for `condition`, returning the old one.
    pub fn replace_condition(&mut self, index: usize, condition: Condition) -> Option<Condition> {
        let slot = self.conditions.get_mut(index)?;
        Some(std::mem::replace(slot, condition))
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    /// Next free Test Case id: one past the current maximum, or 1.
    /// `None` once an imported case already holds `TestCaseId::MAX`.
    pub fn next_test_id(&self) -> Option<TestCaseId> {
        match self.tests.iter().map(|t| t.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Append a test case under [`Self::next_test_id`], leaving the format
    /// untouched when no id is left.
    pub fn add_test(&mut self, input: impl Into<String>, expected: bool) -> Option<TestCaseId> {
        let id = self.next_test_id()?;
        self.tests.push(TestCase {
            id,
            input: input.into(),
            expected,
        });
        Some(id)
    }

    pub fn remove_test(&mut self, id: TestCaseId) -> Option<TestCase> {
        let position = self.tests.iter().position(|t| t.id == id)?;
        Some(self.tests.remove(position))
    }
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub app: ConsumerApp,
    #[serde(default)]
    pub format_scores: BTreeMap<FormatId, i32>,
    #[serde(default)]
    pub tag_scores: BTreeMap<String, i32>,
    #[serde(default)]
    pub min_custom_format_score: i32,
    #[serde(default)]
    pub upgrade_until_score: i32,
    #[serde(default)]
    pub min_score_increment: i32,
    #[serde(default)]
    pub upgrades_allowed: bool,
}

impl Profile {
    pub fn new(name: impl Into<String>, app: ConsumerApp) -> Self {
        Self {
            id: ProfileId::new(),
            name: name.into(),
            app,
            format_scores: BTreeMap::new(),
            tag_scores: BTreeMap::new(),
            min_custom_format_score: 0,
            upgrade_until_score: 0,
            min_score_increment: 0,
            upgrades_allowed: false,
        }
    }

    pub fn with_format_score(mut self, format_id: FormatId, score: i32) -> Self {
        self.format_scores.insert(format_id, score);
        self
    }

    pub fn with_tag_score(mut self, tag: impl Into<String>, score: i32) -> Self {
        self.tag_scores.insert(tag.into(), score);
        self
    }

    pub fn with_upgrades(mut self, upgrade_until_score: i32, min_score_increment: i32) -> Self {
        self.upgrades_allowed = true;
        self.upgrade_until_score = upgrade_until_score;
        self.min_score_increment = min_score_increment;
        self
    }

    pub fn with_min_score(mut self, min_custom_format_score: i32) -> Self {
        self.min_custom_format_score = min_custom_format_score;
        self
    }
}

// ============================================================================
// Domain Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for Condition {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name",
                message: "condition name cannot be empty".into(),
            });
        }
        match &self.kind {
            ConditionKind::Size {
                min_size: Some(min),
                max_size: Some(max),
                ..
            } if min > max => errors.push(ValidationError {
                field: "size",
                message: format!("condition '{}': min size {min} exceeds max size {max}", self.name),
            }),
            ConditionKind::Year {
                min_year: Some(min),
                max_year: Some(max),
            } if min > max => errors.push(ValidationError {
                field: "year",
                message: format!("condition '{}': min year {min} exceeds max year {max}", self.name),
            }),
            _ => {}
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for CustomFormat {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name",
                message: "name cannot be empty".into(),
            });
        }
        for condition in &self.conditions {
            if let Err(condition_errors) = condition.validate() {
                errors.extend(condition_errors);
            }
        }
        let mut seen = HashSet::new();
        for test in &self.tests {
            if !seen.insert(test.id) {
                errors.push(ValidationError {
                    field: "tests",
                    message: format!("duplicate test case id {}", test.id),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for Profile {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name",
                message: "name cannot be empty".into(),
            });
        }
        if self.upgrades_allowed && self.min_score_increment < 0 {
            errors.push(ValidationError {
                field: "min_score_increment",
                message: "minimum score increment must be >= 0".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
