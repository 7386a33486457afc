// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON fixture bundle: named regex patterns, custom formats and profiles
//! loaded together and validated as a unit.

use crate::pattern_registry::RegexPatternRegistry;
use profilarr_config::PatternConfig;
use profilarr_domain::{CustomFormat, Profile, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {item}: {}", .errors.join("; "))]
    Invalid { item: String, errors: Vec<String> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatBundle {
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub formats: Vec<CustomFormat>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl FormatBundle {
    pub fn validate(&self) -> Result<(), BundleError> {
        let mut names = HashSet::new();
        for format in &self.formats {
            if !names.insert(format.name.as_str()) {
                return Err(BundleError::Invalid {
                    item: format!("format '{}'", format.name),
                    errors: vec!["format name is used more than once".into()],
                });
            }
            format.validate().map_err(|errors| BundleError::Invalid {
                item: format!("format '{}'", format.name),
                errors: errors.iter().map(ToString::to_string).collect(),
            })?;
        }
        for profile in &self.profiles {
            profile.validate().map_err(|errors| BundleError::Invalid {
                item: format!("profile '{}'", profile.name),
                errors: errors.iter().map(ToString::to_string).collect(),
            })?;
        }
        Ok(())
    }

    /// Registry over this bundle's patterns.
    pub fn registry(&self, config: &PatternConfig) -> RegexPatternRegistry {
        RegexPatternRegistry::from_sources(config.clone(), self.patterns.clone())
    }

    pub fn format(&self, name: &str) -> Option<&CustomFormat> {
        self.formats.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

pub fn parse_bundle(json: &str) -> Result<FormatBundle, BundleError> {
    let bundle: FormatBundle = serde_json::from_str(json)?;
    bundle.validate()?;
    Ok(bundle)
}

pub fn load_bundle(path: &Path) -> Result<FormatBundle, BundleError> {
    let json = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bundle = parse_bundle(&json)?;
    info!(
        target: "bundle",
        path = %path.display(),
        patterns = bundle.patterns.len(),
        formats = bundle.formats.len(),
        profiles = bundle.profiles.len(),
        "bundle loaded"
    );
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use profilarr_application::PatternRegistry;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "patterns": { "remux": "\\bremux\\b" },
        "formats": [{
            "id": "6f9619ff-8b86-d011-b42d-00cf4fc964ff",
            "name": "Remux",
            "conditions": [
                { "name": "Remux", "type": "release_title", "pattern": "remux", "required": true }
            ],
            "tags": ["lossless"],
            "apps": { "radarr": { "score": 100 }, "sonarr": { "enabled": false } },
            "tests": [ { "id": 1, "input": "Movie.REMUX", "expected": true } ]
        }],
        "profiles": [{
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "name": "Remux-2160p",
            "app": "radarr",
            "tag_scores": { "lossless": 5 },
            "upgrades_allowed": true,
            "upgrade_until_score": 200,
            "min_score_increment": 1
        }]
    }"#;

    #[test]
    fn parses_and_validates() {
        let bundle = parse_bundle(BUNDLE).unwrap();
        let format = bundle.format("remux").unwrap();
        assert_eq!(format.tests.len(), 1);
        assert_eq!(format.app_settings(profilarr_domain::ConsumerApp::Radarr).score, 100);
        assert!(!format.app_settings(profilarr_domain::ConsumerApp::Sonarr).enabled);

        let profile = bundle.profile("Remux-2160p").unwrap();
        assert!(profile.upgrades_allowed);
        assert_eq!(profile.tag_scores.get("lossless"), Some(&5));

        let registry = bundle.registry(&PatternConfig::default());
        assert!(registry.resolve("remux").unwrap().is_match("REMUX"));
    }

    #[test]
    fn unknown_condition_type_is_a_parse_error() {
        let json = BUNDLE.replace("release_title", "bitrate");
        assert!(matches!(parse_bundle(&json), Err(BundleError::Parse(_))));
    }

    #[test]
    fn invalid_format_is_rejected() {
        let json = BUNDLE.replace(r#""name": "Remux","#, r#""name": " ","#);
        match parse_bundle(&json) {
            Err(BundleError::Invalid { item, errors }) => {
                assert!(item.starts_with("format"));
                assert!(errors[0].contains("name"));
            }
            other => panic!("expected invalid bundle, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_format_names_are_rejected() {
        let mut bundle = parse_bundle(BUNDLE).unwrap();
        let mut copy = bundle.formats[0].clone();
        copy.id = profilarr_domain::FormatId::new();
        bundle.formats.push(copy);
        assert!(matches!(bundle.validate(), Err(BundleError::Invalid { .. })));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUNDLE.as_bytes()).unwrap();
        let bundle = load_bundle(file.path()).unwrap();
        assert_eq!(bundle.formats.len(), 1);

        let missing = load_bundle(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(BundleError::Io { .. })));
    }
}
