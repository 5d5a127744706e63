//! User-defined countdown events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::target::CountdownTarget;
use crate::error::ValidationError;

/// Expected lifespan used when a life event does not carry one.
pub const DEFAULT_LIFESPAN_YEARS: f64 = 73.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Life,
    Custom,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Life => "life",
            EventKind::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "life" => Some(EventKind::Life),
            "custom" => Some(EventKind::Custom),
            _ => None,
        }
    }
}

/// A countdown the user keeps in their list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownEvent {
    pub id: String,
    pub name: String,
    pub kind: EventKind,
    pub target_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub motto: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_lifespan: Option<f64>,
    /// Display order, 0-based and contiguous across the catalog.
    #[serde(default)]
    pub position: u32,
}

/// Input for creating a [`CountdownEvent`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub kind: EventKind,
    pub target_at: DateTime<Utc>,
    pub motto: Option<String>,
    pub description: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub expected_lifespan: Option<f64>,
}

impl NewEvent {
    pub fn custom(name: impl Into<String>, target_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            kind: EventKind::Custom,
            target_at,
            motto: None,
            description: None,
            birth_date: None,
            expected_lifespan: None,
        }
    }

    /// A life countdown. The target is derived from birth and lifespan.
    pub fn life(
        name: impl Into<String>,
        birth_date: DateTime<Utc>,
        expected_lifespan: f64,
    ) -> Result<Self, ValidationError> {
        let target = CountdownTarget::age_vs_expectancy(birth_date, expected_lifespan)?;
        Ok(Self {
            name: name.into(),
            kind: EventKind::Life,
            target_at: target.target(),
            motto: None,
            description: None,
            birth_date: Some(birth_date),
            expected_lifespan: Some(expected_lifespan),
        })
    }

    pub fn with_motto(mut self, motto: Option<String>) -> Self {
        self.motto = motto;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub(crate) fn into_event(self, created_at: DateTime<Utc>, position: u32) -> CountdownEvent {
        CountdownEvent {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            kind: self.kind,
            target_at: self.target_at,
            created_at,
            motto: self.motto,
            description: self.description,
            birth_date: self.birth_date,
            expected_lifespan: self.expected_lifespan,
            position,
        }
    }
}

impl CountdownEvent {
    /// Build the countdown target this event is displayed with.
    ///
    /// Custom events measure progress from their creation time. Life events
    /// without a birth date fall back to a target-only countdown.
    pub fn to_target(&self) -> Result<CountdownTarget, ValidationError> {
        match (self.kind, self.birth_date) {
            (EventKind::Life, Some(birth)) => CountdownTarget::age_vs_expectancy(
                birth,
                self.expected_lifespan.unwrap_or(DEFAULT_LIFESPAN_YEARS),
            )
            .map(|t| t.with_allow_negative(true)),
            (EventKind::Life, None) => Ok(CountdownTarget::target_only(self.target_at)),
            (EventKind::Custom, _) => {
                // An event created after its own target is a zero-length span.
                let start = self.created_at.min(self.target_at);
                CountdownTarget::start_to_target(start, self.target_at)
            }
        }
    }
}
