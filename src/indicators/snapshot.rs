//! Stored record of the latest indicator values of an organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{IndicatorRegistry, IndicatorValue};
use crate::models::ResearchOrganization;

/// Indicator values computed at a given time, plus the keys chosen for
/// display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Date of the last computation; absent when no value is known
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,

    #[serde(default)]
    pub values: BTreeMap<String, IndicatorValue>,

    #[serde(default)]
    pub visible: Vec<String>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator of the registry for the organization.
    ///
    /// Indicators that fail are logged and left out.
    pub fn from_registry(
        registry: &IndicatorRegistry,
        organization: &ResearchOrganization,
        now: DateTime<Utc>,
    ) -> Self {
        let mut values = BTreeMap::new();
        for (key, result) in registry.compute_all(organization) {
            match result {
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(indicator = %key, organization = %organization.acronym, "Skipping indicator: {}", e);
                }
            }
        }
        let mut snapshot = Self::new();
        snapshot.set_values(values, now);
        snapshot
    }

    /// Replace the values; `last_update` is reset when the map is empty
    pub fn set_values(&mut self, values: BTreeMap<String, IndicatorValue>, now: DateTime<Utc>) {
        self.last_update = if values.is_empty() { None } else { Some(now) };
        self.values = values;
    }

    pub fn value(&self, key: &str) -> Option<IndicatorValue> {
        self.values.get(key).copied()
    }

    /// Set the visible keys from a list separated by `,`, `;`, `:` or `/`
    pub fn set_visible_keys(&mut self, keys: &str) {
        self.visible = keys
            .split([',', ';', ':', '/'])
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Visible keys joined with commas
    pub fn visible_keys(&self) -> String {
        self.visible.join(",")
    }

    /// Values of the visible indicators in display order; keys without a
    /// value are skipped
    pub fn visible_values(&self) -> Vec<(&str, IndicatorValue)> {
        self.visible
            .iter()
            .filter_map(|key| self.value(key).map(|value| (key.as_str(), value)))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
