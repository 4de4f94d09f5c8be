use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::index::Indices;
use crate::models::{Show, ShowGroup};

/// Name used when a show's date carries no usable year.
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("Invalid pattern for group \"{name}\": {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Assigns a show to a named group (a tour, a year, a festival series...).
pub trait ShowClassifier: Send + Sync {
    fn classify(&self, show: &Show) -> String;
}

/// Groups shows by the year of their date.
#[derive(Debug, Default, Clone, Copy)]
pub struct YearClassifier;

impl ShowClassifier for YearClassifier {
    fn classify(&self, show: &Show) -> String {
        show_year(show)
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string())
    }
}

/// Config file group rule (deserialized from TOML).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GroupRuleConfig {
    pub name: String,
    /// Regex matched against the show's performance name.
    pub pattern: String,
}

/// Ordered regex rules over performance names; first match wins.
/// Shows matching no rule fall back to their year.
#[derive(Debug)]
pub struct RuleClassifier {
    rules: Vec<(String, Regex)>,
}

impl RuleClassifier {
    pub fn new(rules: &[GroupRuleConfig]) -> Result<Self, GroupingError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (rule.name.clone(), re))
                    .map_err(|source| GroupingError::InvalidPattern {
                        name: rule.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }
}

impl ShowClassifier for RuleClassifier {
    fn classify(&self, show: &Show) -> String {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&show.performance_name))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| YearClassifier.classify(show))
    }
}

/// Partition every loaded show into named groups.
///
/// Shows within a group are most recent first; groups are ordered by their
/// most recent show. Equal dates keep snapshot order.
pub fn grouped_shows(indices: &Indices, classifier: &dyn ShowClassifier) -> Vec<ShowGroup> {
    let mut groups: Vec<ShowGroup> = Vec::new();
    let mut slot_of: HashMap<String, usize> = HashMap::new();

    for show in indices.show_order.iter().filter_map(|id| indices.show_by_id.get(id)) {
        let name = classifier.classify(show);
        let slot = *slot_of.entry(name.clone()).or_insert_with(|| {
            groups.push(ShowGroup {
                group_name: name,
                shows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].shows.push(show.clone());
    }

    for group in &mut groups {
        group.shows.sort_by(|a, b| b.date.cmp(&a.date));
    }
    groups.sort_by(|a, b| latest_date(b).cmp(latest_date(a)));
    groups
}

fn latest_date(group: &ShowGroup) -> &str {
    group.shows.first().map_or("", |s| s.date.as_str())
}

fn show_year(show: &Show) -> Option<&str> {
    let year = show.date.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}
