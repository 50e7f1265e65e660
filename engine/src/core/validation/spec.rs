//! Subtitle Specification
//!
//! Authoring limits supplied once per editing session. Every field is optional
//! and an absent field means "unconstrained". When `enabled` is false none of
//! these limits apply.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::cues::markup::text_lines;
use crate::core::{ms_to_sec, TimeMs, TimeSec};

/// Numeric authoring constraints for a track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleSpecification {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<TimeMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<TimeMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines_per_caption: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_characters_per_line: Option<u32>,
}

impl SubtitleSpecification {
    /// An enabled specification with no limits set
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_min_duration_ms(mut self, ms: TimeMs) -> Self {
        self.min_duration_ms = Some(ms);
        self
    }

    pub fn with_max_duration_ms(mut self, ms: TimeMs) -> Self {
        self.max_duration_ms = Some(ms);
        self
    }

    pub fn with_max_lines(mut self, lines: u32) -> Self {
        self.max_lines_per_caption = Some(lines);
        self
    }

    pub fn with_max_characters_per_line(mut self, chars: u32) -> Self {
        self.max_characters_per_line = Some(chars);
        self
    }

    /// Minimum duration in seconds, when enforced
    pub fn min_duration_sec(&self) -> Option<TimeSec> {
        self.min_duration_ms
            .filter(|ms| self.enabled && *ms > 0)
            .map(ms_to_sec)
    }

    /// Maximum duration in seconds, when enforced
    pub fn max_duration_sec(&self) -> Option<TimeSec> {
        self.max_duration_ms
            .filter(|ms| self.enabled && *ms > 0)
            .map(ms_to_sec)
    }

    /// Whether any text limit is in force
    pub fn limits_text(&self) -> bool {
        self.enabled
            && (self.max_lines_per_caption.is_some() || self.max_characters_per_line.is_some())
    }

    /// Checks line count and per-line character count on markup-stripped text
    pub fn text_fits(&self, text: &str) -> bool {
        if !self.limits_text() {
            return true;
        }
        let lines = text_lines(text);
        let lines_ok = self
            .max_lines_per_caption
            .is_none_or(|max| lines.len() <= max as usize);
        let chars_ok = self.max_characters_per_line.is_none_or(|max| {
            lines
                .iter()
                .all(|line| line.chars().count() <= max as usize)
        });
        lines_ok && chars_ok
    }

    /// Checks a duration against the enforced min/max
    pub fn duration_fits(&self, duration_sec: TimeSec) -> bool {
        const EPS: TimeSec = crate::core::TIME_EPSILON;
        let min_ok = self
            .min_duration_sec()
            .is_none_or(|min| duration_sec >= min - EPS);
        let max_ok = self
            .max_duration_sec()
            .is_none_or(|max| duration_sec <= max + EPS);
        duration_sec > 0.0 && min_ok && max_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_spec_ignores_every_limit() {
        let spec = SubtitleSpecification {
            enabled: false,
            min_duration_ms: Some(1000),
            max_duration_ms: Some(2000),
            max_lines_per_caption: Some(1),
            max_characters_per_line: Some(2),
        };
        assert!(spec.min_duration_sec().is_none());
        assert!(spec.max_duration_sec().is_none());
        assert!(spec.text_fits("a very long line\nand another"));
        assert!(spec.duration_fits(10.0));
    }

    #[test]
    fn text_fits_counts_lines_and_characters() {
        let spec = SubtitleSpecification::enabled()
            .with_max_lines(2)
            .with_max_characters_per_line(5);
        assert!(spec.text_fits("12345\nabc"));
        assert!(!spec.text_fits("123456"));
        assert!(!spec.text_fits("a\nb\nc"));
    }

    #[test]
    fn text_fits_ignores_markup() {
        let spec = SubtitleSpecification::enabled().with_max_characters_per_line(5);
        assert!(spec.text_fits("<b>12345</b>"));
    }

    #[test]
    fn duration_fits_respects_bounds() {
        let spec = SubtitleSpecification::enabled()
            .with_min_duration_ms(1200)
            .with_max_duration_ms(5000);
        assert!(!spec.duration_fits(1.0));
        assert!(spec.duration_fits(1.2));
        assert!(spec.duration_fits(5.0));
        assert!(!spec.duration_fits(5.5));
        assert!(!SubtitleSpecification::default().duration_fits(0.0));
    }

    #[test]
    fn deserializes_partial_spec() {
        let spec: SubtitleSpecification =
            serde_json::from_str(r#"{"enabled":true,"minDurationMs":500}"#).unwrap();
        assert_eq!(spec.min_duration_ms, Some(500));
        assert!(spec.max_duration_ms.is_none());
    }
}
