//! Pricing agent: reference-rate suggestions, listing price bands,
//! breakeven and cross-region comparison.

use serde::{Deserialize, Serialize};

use super::{collect_prices, open_listings};
use crate::agent::context::ToolContext;
use crate::agent::heuristics::{median, parse_qty, quartile_bands, round2};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::Scalar;
use crate::error::Result;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "suggestPrice",
                ToolCategory::Pricing,
                "Suggest a price per unit from local country reference rates.",
            ),
            suggest_price,
        )
        .register(
            ToolSpec::new(
                "priceBands",
                ToolCategory::Pricing,
                "Low/median/high price bands for a crop from current listings.",
            ),
            price_bands,
        )
        .register(
            ToolSpec::new(
                "calcBreakeven",
                ToolCategory::Pricing,
                "Breakeven price per unit from simple cost inputs.",
            ),
            calc_breakeven,
        )
        .register(
            ToolSpec::new(
                "compareMarketRates",
                ToolCategory::Pricing,
                "Compare median listing prices for a crop across regions.",
            ),
            compare_market_rates,
        );
}

/// Reference rates and currency for one country
pub struct CountryPricing {
    pub country: &'static str,
    pub symbol: &'static str,
    pub unit: &'static str,
    pub code: &'static str,
    pub rates: &'static [(&'static str, f64)],
}

pub const COUNTRIES: &[CountryPricing] = &[
    CountryPricing { country: "US", symbol: "$", unit: "lb", code: "USD", rates: &[("Tomatoes", 2.5), ("Corn", 1.2), ("Bell peppers", 2.2)] },
    CountryPricing { country: "India", symbol: "₹", unit: "kg", code: "INR", rates: &[("Tomatoes", 30.0), ("Basmati rice", 90.0), ("Okra", 30.0)] },
    CountryPricing { country: "Nigeria", symbol: "₦", unit: "kg", code: "NGN", rates: &[("Cassava", 180.0), ("Millet", 120.0), ("Groundnuts", 220.0)] },
    CountryPricing { country: "Russia", symbol: "₽", unit: "kg", code: "RUB", rates: &[("Potatoes", 35.0), ("Wheat", 25.0), ("Carrots", 28.0)] },
    CountryPricing { country: "Canada", symbol: "$", unit: "kg", code: "CAD", rates: &[("Wheat", 2.1), ("Canola", 2.4), ("Blueberries", 4.0)] },
    CountryPricing { country: "China", symbol: "¥", unit: "kg", code: "CNY", rates: &[("Rice", 6.5), ("Cabbage", 3.2), ("Tomatoes", 5.0)] },
    CountryPricing { country: "Germany", symbol: "€", unit: "kg", code: "EUR", rates: &[("Potatoes", 1.8), ("Apples", 3.0), ("Barley", 1.6)] },
    CountryPricing { country: "Brazil", symbol: "R$", unit: "kg", code: "BRL", rates: &[("Soybeans", 6.0), ("Coffee", 12.0), ("Maize", 3.2)] },
    CountryPricing { country: "Kenya", symbol: "KSh", unit: "kg", code: "KES", rates: &[("Maize", 70.0), ("Kale", 60.0), ("Tomatoes", 90.0)] },
    CountryPricing { country: "Ethiopia", symbol: "Br", unit: "kg", code: "ETB", rates: &[("Teff", 85.0), ("Maize", 55.0), ("Coffee", 120.0)] },
    CountryPricing { country: "Turkey", symbol: "₺", unit: "kg", code: "TRY", rates: &[("Tomatoes", 18.0), ("Wheat", 12.0), ("Olives", 25.0)] },
    CountryPricing { country: "France", symbol: "€", unit: "kg", code: "EUR", rates: &[("Wheat", 1.9), ("Grapes", 4.5), ("Apples", 3.2)] },
    CountryPricing { country: "Spain", symbol: "€", unit: "kg", code: "EUR", rates: &[("Oranges", 2.8), ("Olives", 3.1), ("Tomatoes", 2.4)] },
    CountryPricing { country: "Italy", symbol: "€", unit: "kg", code: "EUR", rates: &[("Tomatoes", 2.7), ("Grapes", 4.8), ("Olives", 3.4)] },
    CountryPricing { country: "Guatemala", symbol: "Q", unit: "kg", code: "GTQ", rates: &[("Coffee", 25.0), ("Bananas", 12.0), ("Cardamom", 40.0)] },
];

/// Regions with higher first-mile logistics cost
pub const PREMIUM_REGIONS: &[&str] = &["Kenya", "Ethiopia", "Nigeria", "Guatemala"];
pub const REGION_MULTIPLIER: f64 = 1.1;
pub const BULK_THRESHOLD: f64 = 1000.0;
pub const BULK_DISCOUNT: f64 = 0.95;
pub const FALLBACK_RATE: f64 = 2.0;

pub fn country_pricing(region: &str) -> Option<&'static CountryPricing> {
    COUNTRIES
        .iter()
        .find(|c| c.country.eq_ignore_ascii_case(region.trim()))
}

fn rate_for(pricing: &CountryPricing, crop: &str) -> Option<f64> {
    pricing
        .rates
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(crop.trim()))
        .map(|(_, rate)| *rate)
}

/// Country rate, then the US rate, then a flat fallback
pub fn base_rate(country: &CountryPricing, crop: &str) -> f64 {
    rate_for(country, crop)
        .or_else(|| country_pricing("US").and_then(|us| rate_for(us, crop)))
        .unwrap_or(FALLBACK_RATE)
}

fn default_region() -> String {
    "US".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestPriceArgs {
    pub crop: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub quantity: Option<Scalar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestPriceResult {
    pub crop: String,
    pub region: String,
    pub quantity: String,
    pub base_price_per_unit: f64,
    pub region_multiplier: f64,
    pub bulk_discount: f64,
    pub suggested_price_per_unit: f64,
    pub range: String,
    pub currency: &'static str,
    pub symbol: &'static str,
    pub unit: &'static str,
}

pub fn suggest_price(_ctx: &ToolContext, args: SuggestPriceArgs) -> Result<SuggestPriceResult> {
    let pricing = country_pricing(&args.region)
        .or_else(|| country_pricing("US"))
        .unwrap_or(&COUNTRIES[0]);
    let base = base_rate(pricing, &args.crop);

    let region_multiplier = if PREMIUM_REGIONS.contains(&pricing.country) {
        REGION_MULTIPLIER
    } else {
        1.0
    };
    let quantity = args.quantity.map(|q| q.to_string()).unwrap_or_default();
    let bulk_discount = if parse_qty(&quantity) >= BULK_THRESHOLD {
        BULK_DISCOUNT
    } else {
        1.0
    };

    let suggested = round2(base * region_multiplier * bulk_discount);
    let range = format!("{} - {}", round2(suggested * 0.9), round2(suggested * 1.1));

    Ok(SuggestPriceResult {
        crop: args.crop,
        region: args.region,
        quantity,
        base_price_per_unit: base,
        region_multiplier,
        bulk_discount,
        suggested_price_per_unit: suggested,
        range,
        currency: pricing.code,
        symbol: pricing.symbol,
        unit: pricing.unit,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBandsArgs {
    #[serde(alias = "product")]
    pub crop: String,
    #[serde(default, alias = "location")]
    pub region: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceBandsResult {
    pub crop: String,
    pub region: String,
    pub low: Option<f64>,
    pub median: Option<f64>,
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<usize>,
    pub note: &'static str,
}

/// Multiplier for a free-text quality tag
pub fn quality_factor(quality: &str) -> f64 {
    let q = quality.to_lowercase();
    if ["organic", "grade a", "export"].iter().any(|k| q.contains(k)) {
        1.08
    } else if ["grade c", "seconds", "blemish"].iter().any(|k| q.contains(k)) {
        0.95
    } else {
        1.0
    }
}

pub fn price_bands(ctx: &ToolContext, args: PriceBandsArgs) -> Result<PriceBandsResult> {
    let farmers = ctx.fixtures.farmers();
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let listings = open_listings(&farmers, region, &args.crop.to_lowercase());
    let prices = collect_prices(&listings);
    let region_label = region.unwrap_or("all").to_string();

    let Some((low, mid, high)) = quartile_bands(&prices) else {
        return Ok(PriceBandsResult {
            crop: args.crop,
            region: region_label,
            low: None,
            median: None,
            high: None,
            examples: None,
            note: "No price data found for this crop/region.",
        });
    };

    let factor = args.quality.as_deref().map(quality_factor).unwrap_or(1.0);
    Ok(PriceBandsResult {
        crop: args.crop,
        region: region_label,
        low: Some(round2(low * factor)),
        median: Some(round2(mid * factor)),
        high: Some(round2(high * factor)),
        examples: Some(prices.len()),
        note: "Bands derived from current listings; quality bias applied if provided.",
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakevenArgs {
    pub unit: String,
    pub quantity: f64,
    pub labor: f64,
    #[serde(default)]
    pub seed: f64,
    #[serde(default)]
    pub fertilizer: f64,
    #[serde(default)]
    pub transport: f64,
    #[serde(default)]
    pub storage: f64,
    #[serde(default)]
    pub overhead: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakevenResult {
    pub unit: String,
    pub quantity: f64,
    pub total_cost: f64,
    pub breakeven_per_unit: f64,
    pub note: &'static str,
}

pub fn calc_breakeven(_ctx: &ToolContext, args: BreakevenArgs) -> Result<BreakevenResult> {
    let quantity = args.quantity.max(1.0);
    let total = args.seed + args.fertilizer + args.labor + args.transport + args.storage + args.overhead;
    Ok(BreakevenResult {
        unit: args.unit,
        quantity,
        total_cost: round2(total),
        breakeven_per_unit: round2(total / quantity),
        note: "Simple breakeven = total costs / quantity (excludes profit margin).",
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRatesArgs {
    pub crop: String,
    pub regions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionComparison {
    pub region: String,
    pub median: Option<f64>,
    pub sample_size: usize,
    pub delta_vs_base_pct: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRatesResult {
    pub crop: String,
    pub base_region: Option<String>,
    pub comparisons: Vec<RegionComparison>,
    pub note: &'static str,
}

pub fn compare_market_rates(ctx: &ToolContext, args: CompareRatesArgs) -> Result<CompareRatesResult> {
    if args.regions.is_empty() {
        return Ok(CompareRatesResult {
            crop: args.crop,
            base_region: None,
            comparisons: Vec::new(),
            note: "No regions provided.",
        });
    }

    let farmers = ctx.fixtures.farmers();
    let crop = args.crop.to_lowercase();
    let medians: Vec<(String, Option<f64>, usize)> = args
        .regions
        .iter()
        .map(|region| {
            let listings = open_listings(&farmers, Some(region), &crop);
            let prices = collect_prices(&listings);
            (region.clone(), median(&prices), prices.len())
        })
        .collect();

    let base = medians[0].1.unwrap_or(0.0);
    let comparisons = medians
        .into_iter()
        .map(|(region, m, sample_size)| {
            let m_val = m.unwrap_or(0.0);
            let delta = if base != 0.0 {
                round2((m_val - base) / base * 100.0)
            } else {
                0.0
            };
            RegionComparison {
                region,
                median: m.filter(|v| *v != 0.0).map(round2),
                sample_size,
                delta_vs_base_pct: delta,
            }
        })
        .collect();

    Ok(CompareRatesResult {
        crop: args.crop,
        base_region: args.regions.first().cloned(),
        comparisons,
        note: "Medians computed from current listings in each region.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::{ctx_with_farmers, empty_ctx};
    use serde_json::json;

    fn suggest(crop: &str, region: &str, quantity: &str) -> SuggestPriceResult {
        let (_dir, ctx) = empty_ctx();
        suggest_price(
            &ctx,
            SuggestPriceArgs {
                crop: crop.to_string(),
                region: region.to_string(),
                quantity: Some(quantity.into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_suggest_price_region_multiplier() {
        let out = suggest("Tomatoes", "Kenya", "250 kg");
        assert_eq!(out.base_price_per_unit, 90.0);
        assert_eq!(out.region_multiplier, 1.1);
        assert_eq!(out.bulk_discount, 1.0);
        assert_eq!(out.suggested_price_per_unit, round2(90.0 * 1.1));
        assert_eq!(out.currency, "KES");
    }

    #[test]
    fn test_suggest_price_bulk_discount() {
        let out = suggest("Tomatoes", "Kenya", "1200 kg");
        assert_eq!(out.bulk_discount, 0.95);
        assert_eq!(out.suggested_price_per_unit, round2(90.0 * 1.1 * 0.95));

        let out = suggest("Corn", "US", "1000 lb");
        assert_eq!(out.suggested_price_per_unit, round2(1.2 * 0.95));
        assert_eq!(out.region_multiplier, 1.0);
    }

    #[test]
    fn test_suggest_price_fallbacks() {
        // Unknown region falls back to US rates and currency
        let out = suggest("Tomatoes", "Atlantis", "");
        assert_eq!(out.base_price_per_unit, 2.5);
        assert_eq!(out.currency, "USD");

        // Crop missing from country table falls back to US, then 2.0
        assert_eq!(suggest("Corn", "India", "").base_price_per_unit, 1.2);
        assert_eq!(suggest("Durian", "India", "").base_price_per_unit, 2.0);
    }

    fn band_farmers() -> serde_json::Value {
        json!([
            {"location": "Kano", "products": [
                {"name": "Tomatoes", "price_per_kg": 1.0},
                {"name": "Tomatoes", "price_per_kg": 2.0},
                {"name": "Tomatoes", "price_per_kg": 3.0},
                {"name": "Tomatoes", "price_per_kg": 4.0},
                {"name": "Tomatoes", "price_per_kg": 99.0, "status": "sold"}
            ]},
            {"location": "Lagos", "products": [
                {"name": "Tomatoes", "price_per_kg": 5.0},
                {"name": "Tomatoes", "price": "6"}
            ]}
        ])
    }

    #[test]
    fn test_price_bands_excludes_sold_and_applies_quality() {
        let (_dir, ctx) = ctx_with_farmers(band_farmers());
        let out = price_bands(
            &ctx,
            PriceBandsArgs {
                crop: "tomatoes".to_string(),
                region: Some("Kano".to_string()),
                quality: None,
            },
        )
        .unwrap();
        assert_eq!(out.low, Some(1.0));
        assert_eq!(out.median, Some(2.5));
        assert_eq!(out.high, Some(4.0));
        assert_eq!(out.examples, Some(4));

        let organic = price_bands(
            &ctx,
            PriceBandsArgs {
                crop: "tomatoes".to_string(),
                region: Some("Kano".to_string()),
                quality: Some("Organic".to_string()),
            },
        )
        .unwrap();
        assert_eq!(organic.median, Some(2.7));
    }

    #[test]
    fn test_price_bands_without_data() {
        let (_dir, ctx) = ctx_with_farmers(band_farmers());
        let out = price_bands(
            &ctx,
            PriceBandsArgs {
                crop: "okra".to_string(),
                region: None,
                quality: None,
            },
        )
        .unwrap();
        assert!(out.low.is_none() && out.median.is_none() && out.high.is_none());
        assert_eq!(out.region, "all");
    }

    #[test]
    fn test_calc_breakeven_guards_zero_quantity() {
        let (_dir, ctx) = empty_ctx();
        let out = calc_breakeven(
            &ctx,
            BreakevenArgs {
                unit: "kg".to_string(),
                quantity: 0.0,
                labor: 120.0,
                seed: 60.0,
                fertilizer: 80.0,
                transport: 70.0,
                storage: 30.0,
                overhead: 20.0,
            },
        )
        .unwrap();
        assert_eq!(out.quantity, 1.0);
        assert_eq!(out.total_cost, 380.0);
        assert_eq!(out.breakeven_per_unit, 380.0);
    }

    #[test]
    fn test_compare_market_rates_deltas() {
        let (_dir, ctx) = ctx_with_farmers(band_farmers());
        let out = compare_market_rates(
            &ctx,
            CompareRatesArgs {
                crop: "Tomatoes".to_string(),
                regions: vec!["Kano".to_string(), "Lagos".to_string(), "Abuja".to_string()],
            },
        )
        .unwrap();
        assert_eq!(out.base_region.as_deref(), Some("Kano"));
        let kano = &out.comparisons[0];
        let lagos = &out.comparisons[1];
        let abuja = &out.comparisons[2];
        assert_eq!(kano.median, Some(2.5));
        assert_eq!(kano.delta_vs_base_pct, 0.0);
        assert_eq!(lagos.median, Some(5.5));
        assert_eq!(lagos.delta_vs_base_pct, 120.0);
        assert_eq!(abuja.median, None);
        assert_eq!(abuja.sample_size, 0);
    }
}
