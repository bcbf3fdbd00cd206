//! High score leaderboard
//!
//! Persisted as JSON; keeps the top 10 scores per match mode.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HighScoreError;

/// Maximum number of high scores kept per mode
pub const MAX_HIGH_SCORES: usize = 10;

/// Longest name accepted at name entry
pub const MAX_NAME_LEN: usize = 10;

/// Solo and co-op scores are ranked separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Solo,
    Coop,
}

impl MatchMode {
    pub fn from_ship_count(ships: usize) -> Self {
        if ships > 1 { MatchMode::Coop } else { MatchMode::Solo }
    }
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
    pub mode: MatchMode,
}

/// High score leaderboard (sorted by score, descending)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn ranked(&self, mode: MatchMode) -> impl Iterator<Item = &HighScoreEntry> {
        self.entries.iter().filter(move |e| e.mode == mode)
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64, mode: MatchMode) -> bool {
        if score == 0 {
            return false;
        }
        if self.ranked(mode).count() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.ranked(mode).last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64, mode: MatchMode) -> Option<usize> {
        if !self.qualifies(score, mode) {
            return None;
        }
        let rank = self.ranked(mode).position(|e| score > e.score);
        Some(rank.unwrap_or_else(|| self.ranked(mode).count()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify
    /// or the name was blank
    pub fn add_score(
        &mut self,
        name: &str,
        score: u64,
        level: u32,
        timestamp: u64,
        mode: MatchMode,
    ) -> Option<usize> {
        let Some(name) = clean_name(name) else {
            log::warn!("Rejected high score {score} with a blank name");
            return None;
        };
        let rank = self.potential_rank(score, mode)?;

        let entry = HighScoreEntry {
            name,
            score,
            level,
            timestamp,
            mode,
        };

        // Find insertion point (sorted descending by score, ties keep older first)
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);

        // Trim this mode to max size
        let mut kept = 0;
        self.entries.retain(|e| {
            if e.mode != mode {
                return true;
            }
            kept += 1;
            kept <= MAX_HIGH_SCORES
        });

        Some(rank)
    }

    /// Best `n` entries for a mode
    pub fn top(&self, mode: MatchMode, n: usize) -> Vec<&HighScoreEntry> {
        self.ranked(mode).take(n).collect()
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score for a mode (if any)
    pub fn top_score(&self, mode: MatchMode) -> Option<u64> {
        self.ranked(mode).next().map(|e| e.score)
    }

    /// Load high scores from a JSON file; a missing file is an empty board
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HighScoreError> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let scores: HighScores = serde_json::from_str(&json)?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Save high scores as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), HighScoreError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Trim and cap a player name; blank names are rejected
pub fn clean_name(name: &str) -> Option<String> {
    let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() { None } else { Some(name) }
}

/// Format a timestamp as a relative date string
pub fn format_age(timestamp: u64, now: u64) -> String {
    let diff_mins = now.saturating_sub(timestamp) / 60;
    let diff_hours = diff_mins / 60;
    let diff_days = diff_hours / 24;

    if diff_days >= 1 {
        if diff_days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", diff_days)
        }
    } else if diff_hours >= 1 {
        if diff_hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", diff_hours)
        }
    } else if diff_mins >= 1 {
        if diff_mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", diff_mins)
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLO: MatchMode = MatchMode::Solo;

    #[test]
    fn test_sorted_descending_with_rank() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score("ann", 500, 2, 0, SOLO), Some(1));
        assert_eq!(scores.add_score("bob", 900, 3, 0, SOLO), Some(1));
        assert_eq!(scores.add_score("cy", 700, 2, 0, SOLO), Some(2));
        // Ties rank after the existing entry
        assert_eq!(scores.add_score("dee", 700, 2, 0, SOLO), Some(3));

        let names: Vec<_> = scores.top(SOLO, 10).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["bob", "cy", "dee", "ann"]);
        assert_eq!(scores.top_score(SOLO), Some(900));
    }

    #[test]
    fn test_capped_at_max() {
        let mut scores = HighScores::new();
        for i in 1..=15u64 {
            scores.add_score("p", i * 100, 1, i, SOLO);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top(SOLO, 1)[0].score, 1500);
        assert!(!scores.qualifies(600, SOLO));
        assert_eq!(scores.potential_rank(650, SOLO), Some(10));
        assert_eq!(scores.add_score("late", 100, 1, 0, SOLO), None);
    }

    #[test]
    fn test_zero_score_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0, SOLO));
        assert!(scores.qualifies(1, SOLO));
    }

    #[test]
    fn test_modes_ranked_separately() {
        let mut scores = HighScores::new();
        for i in 1..=10u64 {
            scores.add_score("solo", 1000 + i, 1, 0, SOLO);
        }
        // A low co-op score still makes the co-op table
        assert_eq!(scores.add_score("duo", 10, 1, 0, MatchMode::Coop), Some(1));
        assert_eq!(scores.top(MatchMode::Coop, 10).len(), 1);
        assert_eq!(scores.top(SOLO, 10).len(), 10);
        assert_eq!(MatchMode::from_ship_count(2), MatchMode::Coop);
    }

    #[test]
    fn test_names_cleaned() {
        assert_eq!(clean_name("  ace  "), Some("ace".to_string()));
        assert_eq!(clean_name("abcdefghijklmno"), Some("abcdefghij".to_string()));
        assert_eq!(clean_name("   "), None);

        let mut scores = HighScores::new();
        assert_eq!(scores.add_score("", 100, 1, 0, SOLO), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut scores = HighScores::new();
        scores.add_score("ann", 300, 2, 1_700_000_000, SOLO);
        scores.add_score("duo", 800, 4, 1_700_000_100, MatchMode::Coop);
        scores.save(&path).unwrap();

        let loaded = HighScores::load(&path).unwrap();
        assert_eq!(loaded.entries, scores.entries);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = HighScores::load(dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(HighScores::load(&path), Err(HighScoreError::Json(_))));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(1000, 1010), "Just now");
        assert_eq!(format_age(0, 60), "1 min ago");
        assert_eq!(format_age(0, 3 * 3600), "3 hours ago");
        assert_eq!(format_age(0, 86_400), "Yesterday");
        assert_eq!(format_age(0, 5 * 86_400), "5 days ago");
    }
}
