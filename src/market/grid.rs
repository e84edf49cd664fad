//! Farmer grid and consumer list view models.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::data::{Consumer, Farmer, Product};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeFilter {
    #[default]
    All,
    Sale,
    Trade,
    Both,
}

impl ModeFilter {
    /// Farmers without a mode are treated as selling
    fn accepts(self, farmer: &Farmer) -> bool {
        let mode = farmer.mode.as_deref().unwrap_or("sale");
        match self {
            ModeFilter::All => true,
            ModeFilter::Sale => mode == "sale",
            ModeFilter::Trade => mode == "trade",
            ModeFilter::Both => mode == "both",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "priceAsc")]
    PriceAsc,
}

/// Country / state / city selection. Records missing a field pass that level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeoFilter {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl GeoFilter {
    fn level_passes(wanted: &Option<String>, actual: &Option<String>) -> bool {
        match (wanted.as_deref().filter(|w| !w.is_empty()), actual.as_deref()) {
            (Some(w), Some(a)) => w == a,
            _ => true,
        }
    }

    pub fn passes(
        &self,
        country: &Option<String>,
        state: &Option<String>,
        city: &Option<String>,
    ) -> bool {
        Self::level_passes(&self.country, country)
            && Self::level_passes(&self.state, state)
            && Self::level_passes(&self.city, city)
    }
}

/// Query string of `GET /api/farmers`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridFilter {
    #[serde(flatten)]
    pub geo: GeoFilter,
    pub q: Option<String>,
    pub mode: ModeFilter,
    pub sort: SortBy,
}

/// One product card in the farmer grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerCard {
    pub farm: String,
    pub farmer: Option<String>,
    pub location: String,
    pub pickup: String,
    pub mode: String,
    pub product: String,
    pub qty: String,
    pub price: Option<String>,
}

fn haystack(parts: impl IntoIterator<Item = String>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn farmer_haystack(f: &Farmer) -> String {
    let products = f.products.iter().map(|p| p.display_name().to_string());
    haystack(
        [&f.farm, &f.farmer, &f.city, &f.state]
            .into_iter()
            .map(|v| v.clone().unwrap_or_default())
            .chain(products),
    )
}

fn short_location(city: &Option<String>, state: &Option<String>) -> String {
    match (city.as_deref().unwrap_or(""), state.as_deref().filter(|s| !s.is_empty())) {
        (city, Some(state)) => format!("{}, {}", city, state),
        (city, None) => city.to_string(),
    }
}

/// Ascending by price; missing or zero prices sort last
fn price_key(p: &Product) -> f64 {
    p.unit_price().filter(|v| *v != 0.0).unwrap_or(f64::MAX)
}

fn sort_products(products: &mut [&Product], sort: SortBy) {
    match sort {
        SortBy::Name => products.sort_by_key(|p| p.display_name().to_lowercase()),
        SortBy::PriceAsc => products.sort_by(|a, b| {
            price_key(a)
                .partial_cmp(&price_key(b))
                .unwrap_or(Ordering::Equal)
        }),
    }
}

/// Filter farmers and flatten them into product cards, farmer order kept
pub fn farmer_cards(farmers: &[Farmer], filter: &GridFilter) -> Vec<FarmerCard> {
    let q = filter
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut cards = Vec::new();
    for farmer in farmers {
        if !filter.geo.passes(&farmer.country, &farmer.state, &farmer.city) {
            continue;
        }
        if !filter.mode.accepts(farmer) {
            continue;
        }
        if let Some(q) = q.as_deref() {
            if !farmer_haystack(farmer).contains(q) {
                continue;
            }
        }

        let mut products: Vec<&Product> = farmer.products.iter().collect();
        sort_products(&mut products, filter.sort);
        for product in products {
            cards.push(FarmerCard {
                farm: farmer.farm.clone().unwrap_or_else(|| "Farm".to_string()),
                farmer: farmer.farmer.clone(),
                location: short_location(&farmer.city, &farmer.state),
                pickup: farmer
                    .pickup
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| "Arrange with farmer".to_string()),
                mode: farmer.mode.clone().unwrap_or_else(|| "sale".to_string()),
                product: product.name.clone().unwrap_or_else(|| "Crop".to_string()),
                qty: product.quantity_text(),
                price: product.price_label(),
            });
        }
    }
    cards
}

/// Query string of `GET /api/consumers`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsumerFilter {
    #[serde(flatten)]
    pub geo: GeoFilter,
    pub q: Option<String>,
}

pub fn filter_consumers(consumers: &[Consumer], filter: &ConsumerFilter) -> Vec<Consumer> {
    let q = filter
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    consumers
        .iter()
        .filter(|c| filter.geo.passes(&c.country, &c.state, &c.city))
        .filter(|c| {
            let Some(q) = q.as_deref() else {
                return true;
            };
            let wants = c.request.as_ref().and_then(|r| r.product.clone());
            haystack(
                [&c.name, &wants, &c.city, &c.state]
                    .into_iter()
                    .map(|v| v.clone().unwrap_or_default()),
            )
            .contains(q)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn farmers() -> Vec<Farmer> {
        serde_json::from_value(json!([
            {"farm": "Green Acres", "country": "US", "state": "Texas", "city": "Austin",
             "mode": "trade",
             "products": [{"name": "Okra", "qty": "10", "price": "3"},
                          {"name": "corn", "qty": "50", "price": "1.2"},
                          {"name": "Beans", "qty": "5"}]},
            {"farm": "Sunrise", "country": "US", "state": "California", "city": "Los Angeles",
             "products": [{"name": "Tomatoes", "qty": "40", "price": "2.5"}]},
            {"farm": "Kano Fields", "country": "Nigeria", "state": "Kano",
             "products": [{"name": "Millet", "qty": "200"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_geo_filter_lets_missing_levels_pass() {
        let filter = GridFilter {
            geo: GeoFilter {
                country: Some("US".to_string()),
                state: Some("Texas".to_string()),
                city: None,
            },
            ..Default::default()
        };
        let cards = farmer_cards(&farmers(), &filter);
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|c| c.farm == "Green Acres"));
        assert_eq!(cards[0].location, "Austin, Texas");
    }

    #[test]
    fn test_sorting_within_a_farmer() {
        let by_name = farmer_cards(&farmers(), &GridFilter::default());
        let names: Vec<&str> = by_name.iter().take(3).map(|c| c.product.as_str()).collect();
        assert_eq!(names, vec!["Beans", "corn", "Okra"]);

        let by_price = farmer_cards(
            &farmers(),
            &GridFilter {
                sort: SortBy::PriceAsc,
                ..Default::default()
            },
        );
        let names: Vec<&str> = by_price.iter().take(3).map(|c| c.product.as_str()).collect();
        assert_eq!(names, vec!["corn", "Okra", "Beans"]);
        assert_eq!(by_price[2].price, None);
    }

    #[test]
    fn test_card_price_matches_sort_key() {
        let farmers: Vec<Farmer> = serde_json::from_value(json!([
            {"farm": "Rano Valley", "products": [
                {"name": "Tomatoes", "price_per_kg": 650},
                {"name": "Onions", "price_per_kg": "bad", "price": "400"},
                {"name": "Milk", "price_per_liter": 55}
            ]}
        ]))
        .unwrap();
        let cards = farmer_cards(
            &farmers,
            &GridFilter {
                sort: SortBy::PriceAsc,
                ..Default::default()
            },
        );
        let shown: Vec<(&str, Option<&str>)> = cards
            .iter()
            .map(|c| (c.product.as_str(), c.price.as_deref()))
            .collect();
        assert_eq!(
            shown,
            vec![
                ("Milk", Some("55/liter")),
                ("Onions", Some("400")),
                ("Tomatoes", Some("650/kg")),
            ]
        );
    }

    #[test]
    fn test_mode_defaults_to_sale_and_search_hits_products() {
        let sale = farmer_cards(
            &farmers(),
            &GridFilter {
                mode: ModeFilter::Sale,
                ..Default::default()
            },
        );
        assert_eq!(sale.len(), 2);
        assert_eq!(sale[0].pickup, "Arrange with farmer");

        let search = farmer_cards(
            &farmers(),
            &GridFilter {
                q: Some("  MILLET ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].location, ", Kano");
    }

    #[test]
    fn test_grid_filter_from_query_names() {
        let filter: GridFilter =
            serde_json::from_value(json!({"country": "US", "mode": "both", "sort": "priceAsc"}))
                .unwrap();
        assert_eq!(filter.geo.country.as_deref(), Some("US"));
        assert_eq!(filter.mode, ModeFilter::Both);
        assert_eq!(filter.sort, SortBy::PriceAsc);
    }

    #[test]
    fn test_consumer_search() {
        let consumers: Vec<Consumer> = serde_json::from_value(json!([
            {"name": "Bistro", "city": "Austin", "request": {"product": "Okra"}},
            {"name": "Cafe", "city": "Kano"}
        ]))
        .unwrap();
        let filter = ConsumerFilter {
            q: Some("okra".to_string()),
            ..Default::default()
        };
        let out = filter_consumers(&consumers, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name.as_deref(), Some("Bistro"));
    }
}
