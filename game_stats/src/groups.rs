//! Named stat groups and the rules that roll one group up into another.
//!
//! Three groups exist by default:
//! - **Game**: the run in progress
//! - **Session**: everything since the program started
//! - **Lifetime**: everything ever recorded, persisted across runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::stat::StatValue;

pub const GAME: &str = "Game";
pub const SESSION: &str = "Session";
pub const LIFETIME: &str = "Lifetime";

pub const KILLS: &str = "Kills";
pub const LEVEL: &str = "Level";
pub const TIME_ALIVE: &str = "Time Alive";
pub const BEST_KILLS: &str = "Best Kills";
pub const BEST_LEVEL: &str = "Best Level";
pub const BEST_TIME: &str = "Best Time";
pub const LEVELS_GAINED: &str = "Levels Gained";
pub const GAMES_PLAYED: &str = "Games Played";

type Group = BTreeMap<String, StatValue>;

/// Stat group name -> stat name -> value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatGroups {
    groups: BTreeMap<String, Group>,
}

impl StatGroups {
    /// Create an empty set of groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default Game / Session / Lifetime layout, all zeroed.
    pub fn with_default_layout() -> Self {
        let mut stats = Self::new();

        let game = stats.groups.entry(GAME.to_string()).or_default();
        game.insert(KILLS.to_string(), StatValue::Int(0));
        game.insert(LEVEL.to_string(), StatValue::Int(0));
        game.insert(TIME_ALIVE.to_string(), StatValue::Float(0.0));

        for name in [SESSION, LIFETIME] {
            let group = stats.groups.entry(name.to_string()).or_default();
            group.insert(KILLS.to_string(), StatValue::Int(0));
            group.insert(TIME_ALIVE.to_string(), StatValue::Float(0.0));
            group.insert(BEST_KILLS.to_string(), StatValue::Int(0));
            group.insert(BEST_LEVEL.to_string(), StatValue::Int(0));
            group.insert(BEST_TIME.to_string(), StatValue::Float(0.0));
            group.insert(LEVELS_GAINED.to_string(), StatValue::Int(0));
            group.insert(GAMES_PLAYED.to_string(), StatValue::Int(0));
        }

        stats
    }

    /// Add an empty group, keeping an existing one untouched.
    pub fn add_group(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    /// Declare a stat with its initial value. Creates the group if needed.
    pub fn define(&mut self, group: &str, stat: &str, initial: StatValue) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(stat.to_string(), initial);
    }

    fn slot_mut(&mut self, group: &str, stat: &str) -> Option<&mut StatValue> {
        if stat.is_empty() {
            error!(group, "Attempting to modify a stat with no name");
            return None;
        }
        let Some(stats) = self.groups.get_mut(group) else {
            error!(group, stat, "Attempting to modify a stat in a stat group that does not exist");
            return None;
        };
        let slot = stats.get_mut(stat);
        if slot.is_none() {
            error!(group, stat, "Attempting to modify a stat that does not exist");
        }
        slot
    }

    /// Overwrite an existing stat. Unknown groups or stats are ignored.
    pub fn set(&mut self, group: &str, stat: &str, value: StatValue) -> bool {
        match self.slot_mut(group, stat) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Add to an existing stat. See [`StatValue::increment`].
    pub fn increment(&mut self, group: &str, stat: &str, amount: &StatValue) -> bool {
        self.slot_mut(group, stat)
            .is_some_and(|slot| slot.increment(amount))
    }

    pub fn get(&self, group: &str, stat: &str) -> Option<&StatValue> {
        if stat.is_empty() {
            warn!(group, "Attempting to get a stat with no name");
            return None;
        }
        let Some(stats) = self.groups.get(group) else {
            error!(group, stat, "Attempting to get a stat in a stat group that does not exist");
            return None;
        };
        let value = stats.get(stat);
        if value.is_none() {
            warn!(group, stat, "Attempting to get a stat that does not exist");
        }
        value
    }

    /// Names of every stat in `group`, sorted.
    pub fn stat_names(&self, group: &str) -> Vec<&str> {
        self.groups
            .get(group)
            .map(|stats| stats.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of every group, sorted.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Zero every stat in `group`.
    pub fn reset(&mut self, group: &str) {
        if group.is_empty() {
            warn!("Attempting to clear a stat group with no name");
            return;
        }
        match self.groups.get_mut(group) {
            Some(stats) => stats.values_mut().for_each(StatValue::reset),
            None => warn!(group, "Attempting to clear a stat group that does not exist"),
        }
    }

    /// Zero every stat in every group.
    pub fn reset_all(&mut self) {
        self.groups
            .values_mut()
            .flat_map(|stats| stats.values_mut())
            .for_each(StatValue::reset);
    }

    /// Drop every group and stat.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Fold the stats of `from` into `to`.
    ///
    /// Supported pairs are Game -> Session and Session -> Lifetime. Bests
    /// keep the larger value, totals add up. Any other pair is ignored.
    pub fn roll_up(&mut self, to: &str, from: &str) -> bool {
        let best_pairs: &[(&str, &str)] = match (from, to) {
            (GAME, SESSION) => &[
                (BEST_KILLS, KILLS),
                (BEST_LEVEL, LEVEL),
                (BEST_TIME, TIME_ALIVE),
            ],
            (SESSION, LIFETIME) => &[
                (BEST_KILLS, BEST_KILLS),
                (BEST_LEVEL, BEST_LEVEL),
                (BEST_TIME, BEST_TIME),
            ],
            _ => {
                warn!(to, from, "Attempted to make an invalid stat update");
                return false;
            }
        };
        let sum_pairs: &[(&str, &str)] = match from {
            GAME => &[(LEVELS_GAINED, LEVEL), (KILLS, KILLS), (TIME_ALIVE, TIME_ALIVE)],
            _ => &[
                (GAMES_PLAYED, GAMES_PLAYED),
                (LEVELS_GAINED, LEVELS_GAINED),
                (KILLS, KILLS),
                (TIME_ALIVE, TIME_ALIVE),
            ],
        };

        let source = self.groups.get(from).cloned().unwrap_or_default();
        let target = self.groups.entry(to.to_string()).or_default();

        for (target_stat, source_stat) in best_pairs {
            if let Some(candidate) = source.get(*source_stat) {
                keep_best(target, target_stat, candidate);
            }
        }
        for (target_stat, source_stat) in sum_pairs {
            if let Some(amount) = source.get(*source_stat) {
                add_into(target, target_stat, amount);
            }
        }
        true
    }
}

fn keep_best(target: &mut Group, stat: &str, candidate: &StatValue) {
    match target.get_mut(stat) {
        Some(current) if *candidate > *current => *current = candidate.clone(),
        Some(_) => {}
        None => {
            target.insert(stat.to_string(), candidate.clone());
        }
    }
}

fn add_into(target: &mut Group, stat: &str, amount: &StatValue) {
    match target.get_mut(stat) {
        Some(current) => {
            current.increment(amount);
        }
        None => {
            target.insert(stat.to_string(), amount.clone());
        }
    }
}
