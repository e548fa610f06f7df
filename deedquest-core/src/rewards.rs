//! Static reward tables and the skill / leveling calculator.
//!
//! The tables are loaded once at start-up (built-in defaults or a JSON file)
//! and never mutated afterwards. Every calculation here is a pure read.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ActivityType, CreationCounter, ReviewType, MAX_SKILL_LEVEL};

/// Creation cap for users without a skill row.
pub const DEFAULT_CREATION_CAP: u32 = 2;

/// Length of the rolling creation window.
pub const CREATION_WINDOW_DAYS: i64 = 7;

/// Highest skill level that still raises the creation cap.
const FIRST_TREE_MAX: u8 = 3;

/// Skill levels that grant an XP multiplier.
const SECOND_TREE: std::ops::RangeInclusive<u8> = 4..=6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewXpRow {
    pub activity_type: ActivityType,
    pub review_type: ReviewType,
    pub xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationCapRow {
    pub skill_level: u8,
    pub cap: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpBonusRow {
    /// Second-tree tier, 1 to 3 (skill level minus 3).
    pub tier: u8,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialTitleRow {
    pub first: ActivityType,
    pub second: Option<ActivityType>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpLevelRow {
    pub level: u32,
    pub xp: i64,
}

/// Serialized form of the reward tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardTableRows {
    pub review_xp: Vec<ReviewXpRow>,
    pub creation_caps: Vec<CreationCapRow>,
    pub xp_bonuses: Vec<XpBonusRow>,
    pub special_titles: Vec<SpecialTitleRow>,
    pub levels: Vec<XpLevelRow>,
    pub puzzle_solve_xp: i64,
    pub happening_attendance_xp: i64,
}

/// Immutable lookup maps built from [`RewardTableRows`].
#[derive(Debug, Clone)]
pub struct RewardTables {
    review_xp: HashMap<(ActivityType, ReviewType), i64>,
    creation_caps: HashMap<u8, u32>,
    xp_bonuses: HashMap<u8, f64>,
    special_titles: HashMap<(ActivityType, Option<ActivityType>), String>,
    /// Sorted by threshold.
    levels: Vec<XpLevelRow>,
    puzzle_solve_xp: i64,
    happening_attendance_xp: i64,
}

impl RewardTables {
    pub fn from_rows(rows: RewardTableRows) -> Result<Self> {
        let mut levels = rows.levels;
        if levels.is_empty() {
            return Err(Error::Invalid("level table is empty".into()));
        }
        levels.sort_by_key(|row| (row.xp, row.level));
        if levels.windows(2).any(|pair| pair[0].level >= pair[1].level) {
            return Err(Error::Invalid(
                "level thresholds must increase with the level".into(),
            ));
        }

        let mut caps = HashMap::new();
        for row in rows.creation_caps {
            if row.skill_level > FIRST_TREE_MAX {
                return Err(Error::Invalid(format!(
                    "creation cap row for skill level {} is outside 0..=3",
                    row.skill_level
                )));
            }
            caps.insert(row.skill_level, row.cap);
        }

        let mut bonuses = HashMap::new();
        for row in rows.xp_bonuses {
            if !(1..=3).contains(&row.tier) || row.multiplier < 0.0 {
                return Err(Error::Invalid(format!("invalid xp bonus tier {}", row.tier)));
            }
            bonuses.insert(row.tier, row.multiplier);
        }

        Ok(Self {
            review_xp: rows
                .review_xp
                .into_iter()
                .map(|row| ((row.activity_type, row.review_type), row.xp))
                .collect(),
            creation_caps: caps,
            xp_bonuses: bonuses,
            special_titles: rows
                .special_titles
                .into_iter()
                .map(|row| (title_key(Some(row.first), row.second), row.title))
                .filter_map(|(key, title)| key.map(|key| (key, title)))
                .collect(),
            levels,
            puzzle_solve_xp: rows.puzzle_solve_xp,
            happening_attendance_xp: rows.happening_attendance_xp,
        })
    }

    /// Loads tables from a JSON file of [`RewardTableRows`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading reward tables from {}", path.display()))?;
        let rows: RewardTableRows = serde_json::from_str(&json)
            .with_context(|| format!("parsing reward tables in {}", path.display()))?;
        Ok(Self::from_rows(rows)?)
    }

    pub fn to_rows(&self) -> RewardTableRows {
        let mut review_xp: Vec<_> = self
            .review_xp
            .iter()
            .map(|(&(activity_type, review_type), &xp)| ReviewXpRow {
                activity_type,
                review_type,
                xp,
            })
            .collect();
        review_xp.sort_by_key(|row| (row.activity_type, row.xp));

        let mut creation_caps: Vec<_> = self
            .creation_caps
            .iter()
            .map(|(&skill_level, &cap)| CreationCapRow { skill_level, cap })
            .collect();
        creation_caps.sort_by_key(|row| row.skill_level);

        let mut xp_bonuses: Vec<_> = self
            .xp_bonuses
            .iter()
            .map(|(&tier, &multiplier)| XpBonusRow { tier, multiplier })
            .collect();
        xp_bonuses.sort_by_key(|row| row.tier);

        let mut special_titles: Vec<_> = self
            .special_titles
            .iter()
            .map(|(&(first, second), title)| SpecialTitleRow {
                first,
                second,
                title: title.clone(),
            })
            .collect();
        special_titles.sort_by_key(|row| (row.first, row.second));

        RewardTableRows {
            review_xp,
            creation_caps,
            xp_bonuses,
            special_titles,
            levels: self.levels.clone(),
            puzzle_solve_xp: self.puzzle_solve_xp,
            happening_attendance_xp: self.happening_attendance_xp,
        }
    }

    /// Activities of one type a user may submit per rolling window.
    ///
    /// `None` means the user has no skill row for the type. Levels above the
    /// first tree reuse the level-3 cap.
    pub fn creation_cap(&self, skill_level: Option<u8>) -> u32 {
        match skill_level {
            None => DEFAULT_CREATION_CAP,
            Some(level) => {
                let clamped = level.min(FIRST_TREE_MAX);
                self.creation_caps
                    .get(&clamped)
                    .copied()
                    .unwrap_or(DEFAULT_CREATION_CAP)
            }
        }
    }

    /// Multiplier applied to XP the user receives for this activity type.
    pub fn xp_multiplier(&self, skill_level: Option<u8>) -> f64 {
        match skill_level {
            Some(level) if SECOND_TREE.contains(&level) => self
                .xp_bonuses
                .get(&(level - FIRST_TREE_MAX))
                .copied()
                .unwrap_or(1.0),
            _ => 1.0,
        }
    }

    /// Title for one or two maxed skills. Pair order does not matter.
    pub fn special_title(
        &self,
        first: Option<ActivityType>,
        second: Option<ActivityType>,
    ) -> Option<&str> {
        let key = title_key(first, second)?;
        self.special_titles.get(&key).map(String::as_str)
    }

    /// Highest level whose threshold is at or below `xp`.
    pub fn potential_level(&self, xp: i64) -> u32 {
        let mut level = self.levels[0].level;
        for row in &self.levels {
            if row.xp > xp {
                break;
            }
            level = row.level;
        }
        level
    }

    pub fn level_threshold(&self, level: u32) -> Option<i64> {
        self.levels.iter().find(|row| row.level == level).map(|row| row.xp)
    }

    pub fn max_level(&self) -> u32 {
        self.levels.last().map(|row| row.level).unwrap_or(1)
    }

    pub fn review_xp(&self, activity_type: ActivityType, review_type: ReviewType) -> i64 {
        self.review_xp
            .get(&(activity_type, review_type))
            .copied()
            .unwrap_or(0)
    }

    /// XP for a review, scaled by the receiving creator's skill.
    pub fn review_reward(
        &self,
        activity_type: ActivityType,
        review_type: ReviewType,
        creator_skill: Option<u8>,
    ) -> i64 {
        scale(
            self.review_xp(activity_type, review_type),
            self.xp_multiplier(creator_skill),
        )
    }

    pub fn puzzle_solve_xp(&self) -> i64 {
        self.puzzle_solve_xp
    }

    pub fn happening_attendance_xp(&self) -> i64 {
        self.happening_attendance_xp
    }
}

impl Default for RewardTables {
    fn default() -> Self {
        // Built-in rows are known to be valid.
        match Self::from_rows(RewardTableRows::default()) {
            Ok(tables) => tables,
            Err(e) => unreachable!("built-in reward tables are invalid: {}", e),
        }
    }
}

impl Default for RewardTableRows {
    fn default() -> Self {
        let review_xp = ActivityType::ALL
            .iter()
            .flat_map(|&activity_type| {
                let scale = match activity_type {
                    ActivityType::Joke | ActivityType::Quote => 1,
                    _ => 2,
                };
                ReviewType::ALL.iter().map(move |&review_type| {
                    let base = match review_type {
                        ReviewType::None => 0,
                        ReviewType::Poor => 5,
                        ReviewType::Good => 25,
                        ReviewType::Awesome => 100,
                    };
                    ReviewXpRow {
                        activity_type,
                        review_type,
                        xp: base * scale,
                    }
                })
            })
            .collect();

        let creation_caps = vec![
            CreationCapRow { skill_level: 0, cap: 2 },
            CreationCapRow { skill_level: 1, cap: 3 },
            CreationCapRow { skill_level: 2, cap: 4 },
            CreationCapRow { skill_level: 3, cap: 6 },
        ];

        let xp_bonuses = vec![
            XpBonusRow { tier: 1, multiplier: 1.5 },
            XpBonusRow { tier: 2, multiplier: 2.0 },
            XpBonusRow { tier: 3, multiplier: 3.0 },
        ];

        let mut special_titles = Vec::new();
        for (i, &first) in ActivityType::ALL.iter().enumerate() {
            special_titles.push(SpecialTitleRow {
                first,
                second: None,
                title: format!("The {}", title_noun(first)),
            });
            for &second in &ActivityType::ALL[i + 1..] {
                special_titles.push(SpecialTitleRow {
                    first,
                    second: Some(second),
                    title: format!("{} {}", title_adjective(first), title_noun(second)),
                });
            }
        }

        // One level per investable skill point, plus the starting level.
        let max_level = ActivityType::ALL.len() as u32 * MAX_SKILL_LEVEL as u32 + 1;
        let levels = (1..=max_level)
            .map(|level| {
                let n = i64::from(level);
                XpLevelRow {
                    level,
                    xp: 50 * (n - 1) * n,
                }
            })
            .collect();

        Self {
            review_xp,
            creation_caps,
            xp_bonuses,
            special_titles,
            levels,
            puzzle_solve_xp: 100,
            happening_attendance_xp: 250,
        }
    }
}

fn title_noun(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::GoodDeed => "Samaritan",
        ActivityType::Joke => "Jester",
        ActivityType::Quote => "Sage",
        ActivityType::Puzzle => "Riddler",
        ActivityType::Happening => "Host",
        ActivityType::Challenge => "Champion",
    }
}

fn title_adjective(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::GoodDeed => "Kindhearted",
        ActivityType::Joke => "Witty",
        ActivityType::Quote => "Wise",
        ActivityType::Puzzle => "Cunning",
        ActivityType::Happening => "Sociable",
        ActivityType::Challenge => "Daring",
    }
}

/// Normalizes a title lookup so `(a, b)` and `(b, a)` hit the same row.
fn title_key(
    first: Option<ActivityType>,
    second: Option<ActivityType>,
) -> Option<(ActivityType, Option<ActivityType>)> {
    match (first, second) {
        (Some(a), Some(b)) if a == b => Some((a, None)),
        (Some(a), Some(b)) => Some((a.min(b), Some(a.max(b)))),
        (Some(a), None) | (None, Some(a)) => Some((a, None)),
        (None, None) => None,
    }
}

/// Applies a multiplier to a base XP amount, rounding to the nearest point.
pub fn scale(base: i64, multiplier: f64) -> i64 {
    (base as f64 * multiplier).round() as i64
}

/// Counts counters of `activity_type` created within the trailing window.
pub fn creation_count_since(
    counters: &[CreationCounter],
    activity_type: ActivityType,
    now: DateTime<Utc>,
    window_days: i64,
) -> usize {
    let cutoff = window_start(now, window_days);
    counters
        .iter()
        .filter(|c| c.activity_type == activity_type && c.created_at > cutoff)
        .count()
}

/// Counters created at or before this instant are stale.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    now - Duration::days(window_days)
}
