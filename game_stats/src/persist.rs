//! Saving and loading stats as JSON.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::StatsError;
use crate::groups::{StatGroups, GAME, LIFETIME, SESSION};
use crate::tracker::StatsTracker;

/// Write `stats` to `path` as pretty JSON.
pub fn write_stats(path: impl AsRef<Path>, stats: &StatGroups) -> Result<(), StatsError> {
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read stat groups from a JSON file written by [`write_stats`].
pub fn read_stats(path: impl AsRef<Path>) -> Result<StatGroups, StatsError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

impl StatsTracker {
    /// Fold the running game into the session and the session into the
    /// lifetime totals, then write everything to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StatsError> {
        let path = path.as_ref();
        let snapshot = self.edit(|stats| {
            stats.roll_up(SESSION, GAME);
            stats.roll_up(LIFETIME, SESSION);
            stats.clone()
        });
        write_stats(path, &snapshot)?;
        info!(path = %path.display(), "Stats saved");
        Ok(())
    }

    /// Replace the tracked stats with the contents of `path`.
    ///
    /// Only the lifetime totals survive a reload; every other group starts
    /// from zero.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), StatsError> {
        let path = path.as_ref();
        let mut loaded = read_stats(path)?;
        let transient: Vec<String> = loaded
            .group_names()
            .into_iter()
            .filter(|group| *group != LIFETIME)
            .map(str::to_string)
            .collect();
        for group in &transient {
            loaded.reset(group);
        }
        *self.stats.borrow_mut() = loaded;
        info!(path = %path.display(), "Stats loaded");
        Ok(())
    }
}
