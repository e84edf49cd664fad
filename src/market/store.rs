use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::grid::{farmer_cards, filter_consumers, ConsumerFilter, FarmerCard, GridFilter};
use crate::data::{Consumer, Farmer, Fixtures, Market, Product, Scalar};
use crate::error::{ListingError, Result};

pub const REQUIRED_MSG: &str = "Required";
pub const POSITIVE_MSG: &str = "Enter a positive number";

/// Body of `POST /api/listings`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingForm {
    pub farm: Option<String>,
    pub product: Option<String>,
    pub qty: Option<Scalar>,
    pub price: Option<Scalar>,
    pub mode: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

/// Strip thousands separators and require a finite number above zero
pub fn require_positive_number(raw: Option<&Scalar>) -> std::result::Result<f64, &'static str> {
    let clean = raw.map(|v| v.to_string().replace(',', "")).unwrap_or_default();
    let clean = clean.trim();
    if clean.is_empty() {
        return Err(REQUIRED_MSG);
    }
    match clean.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(POSITIVE_MSG),
    }
}

fn validate(form: &ListingForm) -> std::result::Result<(f64, f64), ListingError> {
    match (
        require_positive_number(form.qty.as_ref()),
        require_positive_number(form.price.as_ref()),
    ) {
        (Ok(qty), Ok(price)) => Ok((qty, price)),
        (Err(q), Ok(_)) => Err(ListingError::Quantity(q.to_string())),
        (Ok(_), Err(p)) => Err(ListingError::Price(p.to_string())),
        (Err(q), Err(p)) => Err(ListingError::Both {
            qty: q.to_string(),
            price: p.to_string(),
        }),
    }
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Farmers and consumers served by the marketplace endpoints.
///
/// Posted listings live only in memory and are gone after a restart.
#[derive(Debug)]
pub struct MarketStore {
    fixtures: Fixtures,
    farmers: RwLock<Vec<Farmer>>,
    consumers: RwLock<Vec<Consumer>>,
}

impl MarketStore {
    pub fn load(fixtures: Fixtures) -> Self {
        let farmers = fixtures.farmers();
        let consumers = fixtures.consumers();
        info!(
            farmers = farmers.len(),
            consumers = consumers.len(),
            root = %fixtures.root().display(),
            "market store loaded"
        );
        Self {
            fixtures,
            farmers: RwLock::new(farmers),
            consumers: RwLock::new(consumers),
        }
    }

    pub async fn farmer_count(&self) -> usize {
        self.farmers.read().await.len()
    }

    pub async fn farmers(&self) -> Vec<Farmer> {
        self.farmers.read().await.clone()
    }

    /// Validate and prepend a one-product farmer record
    pub async fn post_listing(&self, form: ListingForm) -> Result<Farmer> {
        let (qty, price) = validate(&form)?;

        let record = Farmer {
            country: Some(non_empty(&form.country).unwrap_or_else(|| "US".to_string())),
            state: Some(form.state.clone().unwrap_or_default()),
            city: Some(form.city.clone().unwrap_or_default()),
            farmer: Some("You".to_string()),
            farm: Some(non_empty(&form.farm).unwrap_or_else(|| "Your farm".to_string())),
            pickup: Some(String::new()),
            mode: Some(non_empty(&form.mode).unwrap_or_else(|| "sale".to_string())),
            products: vec![Product {
                name: Some(non_empty(&form.product).unwrap_or_else(|| "Product".to_string())),
                qty: Some(Scalar::Text(Scalar::Number(qty).to_string())),
                price: Some(Scalar::Text(Scalar::Number(price).to_string())),
                ..Default::default()
            }],
            ..Default::default()
        };

        self.farmers.write().await.insert(0, record.clone());
        debug!(farm = ?record.farm, "listing posted");
        Ok(record)
    }

    pub async fn farmer_grid(&self, filter: &GridFilter) -> Vec<FarmerCard> {
        farmer_cards(&self.farmers.read().await, filter)
    }

    pub async fn consumers(&self, filter: &ConsumerFilter) -> Vec<Consumer> {
        filter_consumers(&self.consumers.read().await, filter)
    }

    pub fn market_index(&self) -> Vec<String> {
        self.fixtures.market_index()
    }

    pub fn market(&self, country: &str) -> Option<Market> {
        self.fixtures.market(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use std::fs;

    fn store() -> (tempfile::TempDir, MarketStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("farmers.json"),
            r#"[{"farm":"Old Farm","products":[{"name":"Kale","qty":"5","price":"1"}]}]"#,
        )
        .unwrap();
        let store = MarketStore::load(Fixtures::new(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_require_positive_number() {
        assert_eq!(require_positive_number(Some(&"1,200".into())), Ok(1200.0));
        assert_eq!(require_positive_number(Some(&Scalar::Number(2.5))), Ok(2.5));
        assert_eq!(require_positive_number(None), Err(REQUIRED_MSG));
        assert_eq!(require_positive_number(Some(&" ".into())), Err(REQUIRED_MSG));
        assert_eq!(require_positive_number(Some(&"-3".into())), Err(POSITIVE_MSG));
        assert_eq!(require_positive_number(Some(&"0".into())), Err(POSITIVE_MSG));
        assert_eq!(require_positive_number(Some(&"ten".into())), Err(POSITIVE_MSG));
        assert_eq!(require_positive_number(Some(&"inf".into())), Err(POSITIVE_MSG));
    }

    #[tokio::test]
    async fn test_post_listing_prepends_canonical_record() {
        let (_dir, store) = store();
        let form = ListingForm {
            product: Some("Tomatoes".to_string()),
            qty: Some("40".into()),
            price: Some("2.50".into()),
            ..Default::default()
        };
        let rec = store.post_listing(form).await.unwrap();
        assert_eq!(rec.farmer.as_deref(), Some("You"));
        assert_eq!(rec.farm.as_deref(), Some("Your farm"));

        let farmers = store.farmers().await;
        assert_eq!(farmers.len(), 2);
        let product = &farmers[0].products[0];
        assert_eq!(product.qty, Some(Scalar::Text("40".to_string())));
        assert_eq!(product.price, Some(Scalar::Text("2.5".to_string())));
        assert_eq!(farmers[1].farm.as_deref(), Some("Old Farm"));
    }

    #[tokio::test]
    async fn test_post_listing_reports_each_bad_field() {
        let (_dir, store) = store();
        let err = store
            .post_listing(ListingForm {
                qty: Some("".into()),
                price: Some("abc".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(matches!(
            err,
            HarvestError::Listing(ListingError::Both { ref qty, ref price })
                if qty == REQUIRED_MSG && price == POSITIVE_MSG
        ));

        let err = store
            .post_listing(ListingForm {
                qty: Some("3".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Listing rejected: price: Required");
        assert_eq!(store.farmer_count().await, 1);
    }
}
