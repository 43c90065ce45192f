//! Typed JSON column values shared by several entities.

use chrono::NaiveDate;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// A JSON array of strings (tags on trades, notes and strategies).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Trims, lowercases and de-duplicates while keeping first-seen order.
    pub fn normalized<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            let tag = item.as_ref().trim().to_lowercase();
            if !tag.is_empty() && !out.contains(&tag) {
                out.push(tag);
            }
        }
        StringList(out)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }
}

/// One day of habit completions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub date: NaiveDate,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Dated completion records of a habit, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct HabitLog(pub Vec<HabitCompletion>);

impl HabitLog {
    pub fn on(&self, date: NaiveDate) -> Option<&HabitCompletion> {
        self.0.iter().find(|c| c.date == date)
    }

    pub fn on_mut(&mut self, date: NaiveDate) -> Option<&mut HabitCompletion> {
        self.0.iter_mut().find(|c| c.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_tags_are_lowercase_and_unique() {
        let tags = StringList::normalized([" Breakout", "breakout", "", "FOMO "]);
        assert_eq!(tags, StringList(vec!["breakout".to_string(), "fomo".to_string()]));
    }

    #[test]
    fn habit_log_serializes_as_plain_array() {
        let log = HabitLog(vec![HabitCompletion {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            count: 2,
            note: None,
        }]);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json, serde_json::json!([{ "date": "2024-03-01", "count": 2 }]));
    }
}
