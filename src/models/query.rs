//! Saved search definitions.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Read-only view of every saved query, keyed by feed name.
pub type QuerySnapshot = HashMap<String, SavedQuery>;

/// A saved search that produces one feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedQuery {
    /// Searched one after another, in this order
    pub keywords: Vec<String>,

    /// Listings whose description contains any of these are dropped.
    /// Lowercased on load.
    #[serde(default)]
    pub ignores: BTreeSet<String>,

    /// Free-text place name resolved through the geocoding endpoint
    pub location_name: String,

    /// Search radius in kilometers
    #[serde(default)]
    pub location_radius: u32,

    #[serde(default)]
    pub min_price: u32,

    #[serde(default)]
    pub max_price: u32,
}

impl SavedQuery {
    /// Lowercase the ignore terms so matching is case-insensitive.
    pub fn normalize(&mut self) {
        self.ignores = self
            .ignores
            .iter()
            .map(|term| term.to_lowercase())
            .collect();
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(AppError::validation(format!("query '{name}' has no keywords")));
        }
        if self.min_price > self.max_price {
            return Err(AppError::validation(format!(
                "query '{name}' has min_price {} > max_price {}",
                self.min_price, self.max_price
            )));
        }
        Ok(())
    }

    /// Search radius converted to meters, as the search endpoint expects.
    pub fn radius_meters(&self) -> u64 {
        u64::from(self.location_radius) * 1000
    }

    /// Whether a listing description hits one of the ignore terms.
    pub fn is_ignored(&self, description: &str) -> bool {
        if self.ignores.is_empty() {
            return false;
        }
        let description = description.to_lowercase();
        self.ignores
            .iter()
            .any(|term| description.contains(term.as_str()))
    }
}

/// Parse a saved queries document into a normalized snapshot.
pub fn parse_queries(content: &str) -> Result<QuerySnapshot> {
    let mut queries: QuerySnapshot = toml::from_str(content)?;
    for (name, query) in queries.iter_mut() {
        query.normalize();
        query.validate(name)?;
    }
    Ok(queries)
}
