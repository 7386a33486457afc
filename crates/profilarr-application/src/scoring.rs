// SPDX-License-Identifier: GPL-3.0-or-later

//! Custom format scoring of a release under a profile.

use crate::combinator::applies;
use crate::diagnostics::Diagnostics;
use crate::evaluator::ConditionEvaluator;
use crate::patterns::PatternRegistry;
use profilarr_domain::{ConsumerApp, CustomFormat, FormatId, Profile, ReleaseDescriptor};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub total: i32,
    /// Applying formats, in the order they were supplied.
    pub applied: Vec<FormatId>,
    /// Portion of `total` contributed by tag scores.
    pub tag_bonus: i32,
    pub diagnostics: Diagnostics,
}

/// Sums format and tag scores for releases.
pub struct ScoringEngine<'r> {
    evaluator: ConditionEvaluator<'r>,
}

impl<'r> ScoringEngine<'r> {
    pub fn new(registry: &'r dyn PatternRegistry) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(registry),
        }
    }

    /// Score one release.
    ///
    /// Each applying format contributes the profile's override for its id,
    /// or else its base score for `app`. Every distinct tag carried by an
    /// applying format then adds the profile's score for that tag once.
    /// Formats disabled for `app` are skipped entirely.
    pub fn score(
        &self,
        release: &ReleaseDescriptor,
        formats: &[CustomFormat],
        profile: &Profile,
        app: ConsumerApp,
    ) -> ScoreBreakdown {
        let mut diagnostics = Diagnostics::new();
        let mut total: i32 = 0;
        let mut applied = Vec::new();
        let mut applied_tags = BTreeSet::new();

        for format in formats {
            let settings = format.app_settings(app);
            if !settings.enabled {
                debug!(target: "scoring", format = %format.name, %app, "format disabled for app");
                continue;
            }
            if !applies(&self.evaluator, format, release, &mut diagnostics) {
                continue;
            }

            let score = profile
                .format_scores
                .get(&format.id)
                .copied()
                .unwrap_or(settings.score);
            total = total.saturating_add(score);
            applied.push(format.id);
            applied_tags.extend(format.tags.iter().map(String::as_str));

            debug!(target: "scoring", format = %format.name, score, "format applied");
        }

        let tag_bonus = applied_tags
            .iter()
            .filter_map(|tag| profile.tag_scores.get(*tag))
            .fold(0i32, |acc, score| acc.saturating_add(*score));
        total = total.saturating_add(tag_bonus);

        debug!(
            target: "scoring",
            release = %release.title,
            profile = %profile.name,
            total,
            tag_bonus,
            applied = applied.len(),
            "release scored"
        );

        ScoreBreakdown {
            total,
            applied,
            tag_bonus,
            diagnostics,
        }
    }

    /// Score many releases against the same formats and profile.
    pub fn score_all(
        &self,
        releases: &[ReleaseDescriptor],
        formats: &[CustomFormat],
        profile: &Profile,
        app: ConsumerApp,
    ) -> Vec<ScoreBreakdown> {
        let scores: Vec<_> = releases
            .iter()
            .map(|release| self.score(release, formats, profile, app))
            .collect();

        info!(
            target: "scoring",
            releases = scores.len(),
            formats = formats.len(),
            profile = %profile.name,
            "batch scoring complete"
        );

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::StaticPatternRegistry;
    use profilarr_domain::{Condition, ConditionKind, Source};

    fn registry() -> StaticPatternRegistry {
        StaticPatternRegistry::new()
            .with_pattern("hdr", r"\bHDR(10)?\b")
            .with_pattern("dv", r"\b(DV|DoVi)\b")
            .with_pattern("x265", r"\b(x265|HEVC)\b")
    }

    fn title_format(name: &str, pattern: &str) -> CustomFormat {
        CustomFormat::new(name).with_condition(Condition::new(name, ConditionKind::release_title(pattern)))
    }

    #[test]
    fn override_beats_base_score() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let hdr = title_format("HDR", "hdr").with_app_score(ConsumerApp::Radarr, 10);
        let profile = Profile::new("UHD", ConsumerApp::Radarr).with_format_score(hdr.id, 75);

        let score = engine.score(
            &ReleaseDescriptor::from_title("Movie.2160p.HDR10"),
            std::slice::from_ref(&hdr),
            &profile,
            ConsumerApp::Radarr,
        );
        assert_eq!(score.total, 75);
        assert_eq!(score.applied, vec![hdr.id]);
    }

    #[test]
    fn base_score_is_per_app() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let x265 = title_format("x265", "x265")
            .with_app_score(ConsumerApp::Radarr, -100)
            .with_app_score(ConsumerApp::Sonarr, 20);
        let profile = Profile::new("Any", ConsumerApp::Sonarr);
        let release = ReleaseDescriptor::from_title("Show.S01.1080p.x265");

        let formats = [x265];
        assert_eq!(engine.score(&release, &formats, &profile, ConsumerApp::Radarr).total, -100);
        assert_eq!(engine.score(&release, &formats, &profile, ConsumerApp::Sonarr).total, 20);
    }

    #[test]
    fn tag_bonus_counts_each_tag_once() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let hdr = title_format("HDR", "hdr").with_tag("hdr").with_app_score(ConsumerApp::Radarr, 5);
        let dv = title_format("DV", "dv").with_tag("hdr").with_tag("dv").with_app_score(ConsumerApp::Radarr, 5);
        let profile = Profile::new("UHD", ConsumerApp::Radarr)
            .with_tag_score("hdr", 10)
            .with_tag_score("dv", 3)
            .with_tag_score("unused", 1000);

        let score = engine.score(
            &ReleaseDescriptor::from_title("Movie.2160p.DV.HDR10"),
            &[hdr, dv],
            &profile,
            ConsumerApp::Radarr,
        );
        assert_eq!(score.tag_bonus, 13);
        assert_eq!(score.total, 5 + 5 + 13);
    }

    #[test]
    fn tags_of_non_applying_formats_are_ignored() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let dv = title_format("DV", "dv").with_tag("dv");
        let profile = Profile::new("UHD", ConsumerApp::Radarr).with_tag_score("dv", 50);

        let score = engine.score(
            &ReleaseDescriptor::from_title("Movie.1080p.SDR"),
            &[dv],
            &profile,
            ConsumerApp::Radarr,
        );
        assert_eq!(score.total, 0);
        assert!(score.applied.is_empty());
    }

    #[test]
    fn disabled_formats_are_skipped() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let hdr = title_format("HDR", "hdr")
            .with_app_score(ConsumerApp::Radarr, 40)
            .with_app_disabled(ConsumerApp::Radarr);
        let profile = Profile::new("UHD", ConsumerApp::Radarr).with_format_score(hdr.id, 99);

        let score = engine.score(
            &ReleaseDescriptor::from_title("Movie.HDR"),
            &[hdr],
            &profile,
            ConsumerApp::Radarr,
        );
        assert_eq!(score.total, 0);
        assert!(score.applied.is_empty());
    }

    #[test]
    fn applied_follows_input_order_and_is_deterministic() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let bluray = CustomFormat::new("Bluray")
            .with_condition(Condition::new("src", ConditionKind::source(Source::Bluray)))
            .with_app_score(ConsumerApp::Radarr, 1);
        let hdr = title_format("HDR", "hdr").with_app_score(ConsumerApp::Radarr, 2);
        let x265 = title_format("x265", "x265").with_app_score(ConsumerApp::Radarr, 4);
        let formats = vec![x265.clone(), bluray.clone(), hdr.clone()];
        let profile = Profile::new("UHD", ConsumerApp::Radarr);
        let release = ReleaseDescriptor::from_title("Movie.HDR.x265").with_source(Source::Bluray);

        let first = engine.score(&release, &formats, &profile, ConsumerApp::Radarr);
        let second = engine.score(&release, &formats, &profile, ConsumerApp::Radarr);
        assert_eq!(first, second);
        assert_eq!(first.applied, vec![x265.id, bluray.id, hdr.id]);
        assert_eq!(first.total, 7);
    }

    #[test]
    fn unknown_patterns_surface_in_breakdown() {
        let registry = registry();
        let engine = ScoringEngine::new(&registry);
        let ghost = title_format("Ghost", "nope").with_app_score(ConsumerApp::Radarr, 10);
        let profile = Profile::new("Any", ConsumerApp::Radarr);

        let scores = engine.score_all(
            &[ReleaseDescriptor::from_title("a"), ReleaseDescriptor::from_title("b")],
            &[ghost],
            &profile,
            ConsumerApp::Radarr,
        );
        assert_eq!(scores.len(), 2);
        for score in scores {
            assert_eq!(score.total, 0);
            assert_eq!(score.diagnostics.len(), 1);
        }
    }
}
