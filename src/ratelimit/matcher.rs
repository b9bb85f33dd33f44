use super::identifier::ResolvedIdentifier;
use super::model::RateLimit;
use log::debug;
use std::fmt;

/// Matching strategies, in evaluation order. The first one that finds a record wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    ExactId,
    IdPrefix,
    ExactModel,
    BaseModel,
}

impl MatchStrategy {
    pub const ORDER: [MatchStrategy; 4] = [
        MatchStrategy::ExactId,
        MatchStrategy::IdPrefix,
        MatchStrategy::ExactModel,
        MatchStrategy::BaseModel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::ExactId => "exact_id",
            MatchStrategy::IdPrefix => "id_prefix",
            MatchStrategy::ExactModel => "exact_model",
            MatchStrategy::BaseModel => "base_model",
        }
    }

    fn matches(&self, key: &ResolvedIdentifier, record: &RateLimit) -> bool {
        match self {
            MatchStrategy::ExactId => record.id == key.search_key,
            MatchStrategy::IdPrefix => {
                record.id == key.search_key
                    || record
                        .id
                        .strip_prefix(key.search_key.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            MatchStrategy::ExactModel => {
                !key.derived_model.is_empty() && record.model == key.derived_model
            }
            MatchStrategy::BaseModel => key
                .derived_model
                .split_once('-')
                .is_some_and(|(base, _)| record.model.starts_with(base)),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub strategy: MatchStrategy,
    pub record: &'a RateLimit,
}

// Within one strategy the first record in catalog order wins. No other tie-break.
pub fn find_rate_limit<'a>(
    catalog: &'a [RateLimit],
    key: &ResolvedIdentifier,
) -> Option<Match<'a>> {
    for strategy in MatchStrategy::ORDER {
        if let Some(record) = catalog.iter().find(|r| strategy.matches(key, r)) {
            debug!(
                "matched {} -> {} via {}",
                key.search_key, record.id, strategy
            );
            return Some(Match { strategy, record });
        }
    }
    None
}
