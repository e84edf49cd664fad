//! Plain records decoded from the static JSON fixtures.
//!
//! Fixtures are hand-edited demo data, so every field is optional and
//! numbers may show up as strings (`"2.5"`) or the other way round.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A JSON scalar that may be either a number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric value, parsing strings leniently
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            Scalar::Number(_) => None,
            Scalar::Text(s) => s.trim().replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// `null` decodes to the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Booleans that may arrive as `"yes"`, `"true"`, `1` and so on
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(serde_json::Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Decode a list one element at a time, dropping elements that do not fit
pub(crate) fn lenient_list<T: DeserializeOwned>(values: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(what, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn lenient_farmers<'de, D>(deserializer: D) -> Result<Vec<Farmer>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(lenient_list(values, "farmer"))
}

fn lenient_consumers<'de, D>(deserializer: D) -> Result<Vec<Consumer>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(lenient_list(values, "consumer"))
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_liter: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_ton: Option<Scalar>,
    #[serde(deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub barter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(rename = "moisturePct", skip_serializing_if = "Option::is_none")]
    pub moisture_pct: Option<Scalar>,
}

impl Product {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Free-text quantity (`qty` wins over `quantity`)
    pub fn quantity_text(&self) -> String {
        self.qty
            .as_ref()
            .or(self.quantity.as_ref())
            .map(|q| q.to_string())
            .unwrap_or_default()
    }

    /// Per-unit price: per kg, then per liter, then per ton, then the bare `price`
    pub fn unit_price(&self) -> Option<f64> {
        [
            &self.price_per_kg,
            &self.price_per_liter,
            &self.price_per_ton,
            &self.price,
        ]
        .into_iter()
        .flatten()
        .find_map(Scalar::as_f64)
    }

    /// Unit label matching [`Product::unit_price`]
    pub fn moisture(&self) -> Option<f64> {
        self.moisture_pct.as_ref().and_then(Scalar::as_f64)
    }

    pub fn price_unit(&self) -> &'static str {
        let parses = |v: &Option<Scalar>| v.as_ref().and_then(Scalar::as_f64).is_some();
        if parses(&self.price_per_kg) {
            "/kg"
        } else if parses(&self.price_per_liter) {
            "/liter"
        } else if parses(&self.price_per_ton) {
            "/ton"
        } else {
            ""
        }
    }

    /// Display price such as `"650/kg"` or `"2.5"`
    pub fn price_label(&self) -> Option<String> {
        self.unit_price()
            .map(|price| format!("{}{}", price, self.price_unit()))
    }

    pub fn is_sold(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("sold"))
    }

    pub fn is_available(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("available"))
    }

    pub fn name_contains(&self, needle_lower: &str) -> bool {
        self.display_name().to_lowercase().contains(needle_lower)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Farmer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub wants: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
}

impl Farmer {
    /// Stable identifier: id, then farm, then name
    pub fn identifier(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.to_string())
            .or_else(|| self.farm.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.farm.clone())
            .or_else(|| self.farmer.clone())
            .unwrap_or_else(|| "Farmer".to_string())
    }

    /// `"<city>, <state>"` when a city is set, otherwise the free-text location
    pub fn display_location(&self) -> String {
        match self.city.as_deref().filter(|c| !c.is_empty()) {
            Some(city) => format!("{}, {}", city, self.state.as_deref().unwrap_or("")),
            None => self.location.clone().unwrap_or_default(),
        }
    }

    /// Case-insensitive substring match of the region against location fields
    pub fn in_region(&self, region: &str) -> bool {
        let region = region.to_lowercase();
        [&self.location, &self.city, &self.state, &self.country]
            .into_iter()
            .flatten()
            .any(|v| v.to_lowercase().contains(&region))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consumer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<ConsumerRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Business {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub responses: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub updates: Vec<GrantUpdate>,
}

impl GrantRecord {
    pub fn is_progressing(&self) -> bool {
        self.updates.iter().any(|u| {
            let s = u.status.to_lowercase();
            s.contains("approved") || s.contains("scheduled")
        })
    }
}

/// One country's market snapshot (`data/markets/<country>.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Market {
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "lenient_farmers")]
    pub farmers: Vec<Farmer>,
    #[serde(deserialize_with = "lenient_consumers")]
    pub consumers: Vec<Consumer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_accepts_numbers_and_strings() {
        let p: Product = serde_json::from_str(
            r#"{"name":"Tomatoes","qty":"40 kg","price":"2.50","price_per_kg":null}"#,
        )
        .unwrap();
        assert_eq!(p.unit_price(), Some(2.5));
        assert_eq!(p.quantity_text(), "40 kg");

        let p: Product = serde_json::from_str(r#"{"name":"Milk","price_per_liter":1.2}"#).unwrap();
        assert_eq!(p.unit_price(), Some(1.2));
        assert_eq!(p.price_unit(), "/liter");
    }

    #[test]
    fn test_scalar_display_drops_trailing_zero() {
        assert_eq!(Scalar::Number(40.0).to_string(), "40");
        assert_eq!(Scalar::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_farmer_location_and_identifier() {
        let f = Farmer {
            farm: Some("Sunrise Farm".to_string()),
            city: Some("Kano".to_string()),
            state: Some("Kano State".to_string()),
            location: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(f.display_location(), "Kano, Kano State");
        assert_eq!(f.identifier(), "Sunrise Farm");
        assert_eq!(f.display_name(), "Sunrise Farm");
        assert!(f.in_region("kano"));
    }

    #[test]
    fn test_null_lists_and_loose_scalars_decode() {
        let f: Farmer = serde_json::from_str(r#"{"name":"B","wants":null,"products":null}"#).unwrap();
        assert!(f.wants.is_empty());
        assert!(f.products.is_empty());

        let p: Product =
            serde_json::from_str(r#"{"name":"Maize","barter":"yes","moisturePct":"13.5"}"#).unwrap();
        assert_eq!(p.barter, Some(true));
        assert_eq!(p.moisture(), Some(13.5));

        let p: Product = serde_json::from_str(r#"{"name":"Maize","barter":"maybe"}"#).unwrap();
        assert_eq!(p.barter, None);
    }

    #[test]
    fn test_market_skips_bad_farmers() {
        let m: Market = serde_json::from_str(
            r#"{"country":"Kenya","farmers":[{"name":"A"},{"name":["bad"]}],"consumers":null}"#,
        )
        .unwrap();
        assert_eq!(m.farmers.len(), 1);
        assert!(m.consumers.is_empty());
    }

    #[test]
    fn test_grant_progress() {
        let g: GrantRecord =
            serde_json::from_str(r#"{"applicant":"A","updates":[{"status":"Site visit Scheduled"}]}"#)
                .unwrap();
        assert!(g.is_progressing());
    }
}
