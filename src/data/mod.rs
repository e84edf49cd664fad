//! Static fixture loader.
//!
//! Fixtures are read from disk on every call; a missing or malformed file
//! degrades to the caller's fallback and is never surfaced as an error.

pub mod records;

pub use records::{
    Business, Consumer, ConsumerRequest, Farmer, GrantRecord, GrantUpdate, Market, Product,
    Scalar,
};

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FARMERS_FILE: &str = "farmers.json";
pub const CONSUMERS_FILE: &str = "consumers.json";
pub const BUSINESS_FILE: &str = "business.json";
pub const GRANTS_FILE: &str = "grants.json";
pub const US_MARKETS_FILE: &str = "us_markets.json";
pub const MARKETS_DIR: &str = "markets";

/// Read-only view over the fixture directory
#[derive(Debug, Clone)]
pub struct Fixtures {
    root: PathBuf,
}

impl Fixtures {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode `<root>/<rel_path>` or return `fallback` on any failure
    pub fn load_json<T: DeserializeOwned>(&self, rel_path: &str, fallback: T) -> T {
        let path = self.root.join(rel_path);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "fixture unreadable, using fallback");
                return fallback;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "fixture malformed, using fallback");
                fallback
            }
        }
    }

    /// Decode a JSON array record by record; records that do not fit are
    /// skipped so one bad entry never hides the rest of the file
    pub fn load_records<T: DeserializeOwned>(&self, rel_path: &str) -> Vec<T> {
        let values: Vec<serde_json::Value> = self.load_json(rel_path, Vec::new());
        records::lenient_list(values, rel_path)
    }

    pub fn farmers(&self) -> Vec<Farmer> {
        self.load_records(FARMERS_FILE)
    }

    pub fn consumers(&self) -> Vec<Consumer> {
        self.load_records(CONSUMERS_FILE)
    }

    pub fn businesses(&self) -> Vec<Business> {
        self.load_records(BUSINESS_FILE)
    }

    pub fn grants(&self) -> Vec<GrantRecord> {
        self.load_records(GRANTS_FILE)
    }

    /// Legacy US snapshot kept outside `markets/`
    pub fn us_markets(&self) -> Option<Market> {
        self.load_json::<Option<Market>>(US_MARKETS_FILE, None)
    }

    /// Country snapshot from `markets/<country>.json`; the US falls back to
    /// `us_markets.json`
    pub fn market(&self, country: &str) -> Option<Market> {
        let slug = market_slug(country)?;
        let rel = format!("{}/{}.json", MARKETS_DIR, slug);
        let found = self.load_json::<Option<Market>>(&rel, None).or_else(|| {
            matches!(slug.as_str(), "us" | "usa" | "united_states")
                .then(|| self.us_markets())
                .flatten()
        });
        found.map(|mut m| {
            if m.country.is_empty() {
                m.country = country.to_string();
            }
            m
        })
    }

    /// Country slugs with a market file, sorted
    pub fn market_index(&self) -> Vec<String> {
        let mut out: Vec<String> = std::fs::read_dir(self.root.join(MARKETS_DIR))
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("json") {
                    return None;
                }
                path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            })
            .collect();
        if self.root.join(US_MARKETS_FILE).is_file() && !out.iter().any(|s| s == "us") {
            out.push("us".to_string());
        }
        out.sort();
        out
    }
}

/// Lowercase file slug for a country name; rejects anything path-like
fn market_slug(country: &str) -> Option<String> {
    let slug: String = country
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    Some(slug)
}
