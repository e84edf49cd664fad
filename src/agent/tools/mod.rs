//! Tool handlers served by the agent bridge, grouped by agent persona.

pub mod barter;
pub mod coop;
pub mod grants;
pub mod insights;
pub mod listings;
pub mod logistics;
pub mod matching;
pub mod notify;
pub mod pricing;
pub mod quality;
pub mod risk;
pub mod translator;

use crate::agent::heuristics::pseudo_distance;
use crate::agent::registry::ToolRegistry;
use crate::data::{Farmer, Product};

/// Registry with every built-in tool
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    matching::register(&mut registry);
    pricing::register(&mut registry);
    barter::register(&mut registry);
    grants::register(&mut registry);
    logistics::register(&mut registry);
    notify::register(&mut registry);
    translator::register(&mut registry);
    insights::register(&mut registry);
    risk::register(&mut registry);
    coop::register(&mut registry);
    quality::register(&mut registry);
    listings::register(&mut registry);
    registry
}

/// Visit every (farmer, product) pair, optionally restricted to a region
pub(crate) fn for_each_listing<'a, F>(farmers: &'a [Farmer], region: Option<&str>, mut visit: F)
where
    F: FnMut(&'a Farmer, &'a Product),
{
    for farmer in farmers {
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            if !farmer.in_region(region) {
                continue;
            }
        }
        for product in &farmer.products {
            visit(farmer, product);
        }
    }
}

/// Unsold listings in `region` whose name contains `crop_lower`
pub(crate) fn open_listings<'a>(
    farmers: &'a [Farmer],
    region: Option<&str>,
    crop_lower: &str,
) -> Vec<&'a Product> {
    let mut out = Vec::new();
    for_each_listing(farmers, region, |_, p| {
        if p.name_contains(crop_lower) && !p.is_sold() {
            out.push(p);
        }
    });
    out
}

/// Positive unit prices from a set of listings
pub(crate) fn collect_prices(listings: &[&Product]) -> Vec<f64> {
    listings
        .iter()
        .filter_map(|p| p.unit_price())
        .filter(|v| *v > 0.0)
        .collect()
}

/// Pseudo-distance from `origin` to a farmer, 0 without an origin
pub(crate) fn farmer_distance(origin: Option<&str>, farmer: &Farmer) -> u32 {
    match origin {
        Some(origin) if !origin.is_empty() => pseudo_distance(origin, &farmer.display_location()),
        _ => 0,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_names() {
        let registry = default_registry();
        for name in [
            "findSuppliers",
            "scoreMatch",
            "verifySpec",
            "suggestPrice",
            "priceBands",
            "calcBreakeven",
            "compareMarketRates",
            "findBarterMatch",
            "evaluateTradeValue",
            "initiateExchange",
            "scoreGrant",
            "verifyDocs",
            "suggestImprovements",
            "planRoute",
            "schedulePickup",
            "optimizeDelivery",
            "calculateFuel",
            "evaluateRisk",
            "notify",
            "sendEmail",
            "sendSMS",
            "pushAlert",
            "scheduleNotification",
            "getNotificationHistory",
            "detectLanguage",
            "translateText",
            "autoTranslate",
            "preserveFields",
            "summarizeKPI",
            "analyzeTrends",
            "priceTrends",
            "climateImpact",
            "sdgScore",
            "generateReport",
            "priceVolatility",
            "deliveryDelayRisk",
            "aggregateRisk",
            "recommendMitigation",
            "groupByCrop",
            "analyzeVolume",
            "createBulkLot",
            "gradeProduct",
            "flagIssue",
            "recommendHandling",
            "publishListing",
            "enrichListing",
        ] {
            assert!(registry.contains(name), "missing tool {name}");
        }
        assert_eq!(registry.len(), 46);
    }
}
