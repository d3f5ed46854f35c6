// Handwriting progress per word, capped at HANDWRITING_GOAL successful traces.
// Persisted as a small JSON document next to the config.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Counter ceiling; reaching it means the word is done.
pub const HANDWRITING_GOAL: u32 = 200;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    #[serde(default)]
    handwriting: BTreeMap<String, u32>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no progress file at {}, starting fresh", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        debug!("progress saved to {}", path.display());
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut ledger: Self = serde_json::from_str(text)?;
        // Hand-edited files may overshoot the goal.
        for count in ledger.handwriting.values_mut() {
            *count = (*count).min(HANDWRITING_GOAL);
        }
        Ok(ledger)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn count(&self, word: &str) -> u32 {
        self.handwriting.get(word).copied().unwrap_or(0)
    }

    /// One more successful trace of `word`; stops at the goal. Returns the new count.
    pub fn record(&mut self, word: &str) -> u32 {
        let count = self.handwriting.entry(word.to_owned()).or_insert(0);
        *count = (*count + 1).min(HANDWRITING_GOAL);
        info!("handwriting progress for {:?}: {}/{}", word, *count, HANDWRITING_GOAL);
        *count
    }

    /// Share of the goal reached, 0..=100.
    pub fn progress_percent(&self, word: &str) -> f32 {
        (self.count(word) as f32 / HANDWRITING_GOAL as f32 * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_up_and_stops_at_the_goal() {
        let mut ledger = ProgressLedger::new();
        assert_eq!(ledger.count("cat"), 0);
        assert_eq!(ledger.record("cat"), 1);
        assert_eq!(ledger.progress_percent("cat"), 0.5);

        for _ in 0..500 {
            ledger.record("cat");
        }
        assert_eq!(ledger.count("cat"), HANDWRITING_GOAL);
        assert_eq!(ledger.progress_percent("cat"), 100.0);
        assert_eq!(ledger.count("dog"), 0);
    }

    #[test]
    fn json_shape_is_a_word_map() {
        let mut ledger = ProgressLedger::new();
        ledger.record("book");
        ledger.record("book");
        let json = ledger.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["handwriting"]["book"], 2);
        assert_eq!(ProgressLedger::from_json(&json).unwrap(), ledger);
    }

    #[test]
    fn overshooting_counts_are_clamped_on_load() {
        let ledger = ProgressLedger::from_json(r#"{ "handwriting": { "cat": 999 } }"#).unwrap();
        assert_eq!(ledger.count("cat"), HANDWRITING_GOAL);
    }

    #[test]
    fn missing_section_is_empty() {
        let ledger = ProgressLedger::from_json("{}").unwrap();
        assert_eq!(ledger, ProgressLedger::new());
        assert!(ProgressLedger::from_json("not json").is_err());
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("trace-tutor-progress-{}.json", std::process::id()));
        let mut ledger = ProgressLedger::new();
        ledger.record("house");
        ledger.save(&path).unwrap();

        let loaded = ProgressLedger::load(&path).unwrap();
        assert_eq!(loaded.count("house"), 1);
        let _ = fs::remove_file(&path);

        let missing = ProgressLedger::load(&path).unwrap();
        assert_eq!(missing.count("house"), 0);
    }
}
