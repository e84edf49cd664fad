//! Buyer-side matching: supplier search, supplier scoring, spec checks.

use serde::{Deserialize, Serialize};

use super::{farmer_distance, for_each_listing};
use crate::agent::context::ToolContext;
use crate::agent::heuristics::{parse_qty, pseudo_distance, round2};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::{Farmer, Product, Scalar};
use crate::error::Result;

const MAX_SUPPLIERS: usize = 15;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "findSuppliers",
                ToolCategory::Matching,
                "Find farmers who can supply a crop within a distance, nearest first.",
            ),
            find_suppliers,
        )
        .register(
            ToolSpec::new(
                "scoreMatch",
                ToolCategory::Matching,
                "Score a supplier against buyer criteria (distance, price, quality).",
            ),
            score_match,
        )
        .register(
            ToolSpec::new(
                "verifySpec",
                ToolCategory::Matching,
                "Verify grade, certification and moisture for a listing.",
            ),
            verify_spec,
        );
}

fn default_max_distance() -> f64 {
    150.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindSuppliersArgs {
    pub crop: String,
    #[serde(default)]
    pub min_qty: Option<Scalar>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_max_distance")]
    pub max_distance_km: f64,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierHit {
    pub supplier_id: String,
    pub supplier_name: String,
    pub product: String,
    pub quantity: String,
    pub distance_km: u32,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FindSuppliersResult {
    pub suppliers: Vec<SupplierHit>,
}

fn mentions_quality(product: &Product, quality_lower: &str) -> bool {
    [&product.notes, &product.grade, &product.certification, &product.name]
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(quality_lower))
}

pub fn find_suppliers(ctx: &ToolContext, args: FindSuppliersArgs) -> Result<FindSuppliersResult> {
    let farmers = ctx.fixtures.farmers();
    let crop = args.crop.to_lowercase();
    let min_qty = args.min_qty.map(|q| parse_qty(&q.to_string())).unwrap_or(0.0);
    let location = args.location.as_deref().filter(|l| !l.is_empty());
    let quality = args.quality.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty());

    let mut hits = Vec::new();
    for_each_listing(&farmers, None, |farmer, product| {
        if !product.name_contains(&crop) {
            return;
        }
        let dist = farmer_distance(location, farmer);
        if location.is_some() && f64::from(dist) > args.max_distance_km {
            return;
        }
        if parse_qty(&product.quantity_text()) < min_qty {
            return;
        }
        if let Some(q) = quality.as_deref() {
            if !mentions_quality(product, q) {
                return;
            }
        }
        hits.push(SupplierHit {
            supplier_id: farmer.identifier(),
            supplier_name: farmer.display_name(),
            product: product.display_name().to_string(),
            quantity: product.quantity_text(),
            distance_km: dist,
            location: farmer.display_location(),
            price_per_unit: product.unit_price(),
        });
    });

    hits.sort_by_key(|h| h.distance_km);
    hits.truncate(MAX_SUPPLIERS);
    Ok(FindSuppliersResult { suppliers: hits })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCriteria {
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub target_price_per_unit: Option<f64>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub freshness: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchArgs {
    pub supplier_id: Scalar,
    #[serde(default)]
    pub criteria: MatchCriteria,
}

#[derive(Debug, Serialize)]
pub struct MatchBreakdown {
    pub proximity: f64,
    pub price: f64,
    pub intent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchResult {
    pub supplier_id: String,
    pub score: f64,
    pub breakdown: MatchBreakdown,
    pub found: bool,
}

pub fn score_match(ctx: &ToolContext, args: ScoreMatchArgs) -> Result<ScoreMatchResult> {
    let supplier_id = args.supplier_id.to_string();
    let farmers = ctx.fixtures.farmers();
    let supplier = farmers.iter().find(|f| f.identifier() == supplier_id);
    let criteria = &args.criteria;

    let proximity = match (criteria.distance_km, criteria.location.as_deref(), supplier) {
        (Some(d), _, _) => 1.0 - (d.max(0.0) / 200.0).min(1.0),
        (None, Some(loc), Some(f)) => {
            1.0 - (f64::from(pseudo_distance(loc, &f.display_location())) / 200.0).min(1.0)
        }
        _ => 0.5,
    };

    let best_price = supplier.and_then(cheapest_price);
    let price = match (best_price, criteria.target_price_per_unit) {
        (Some(p), Some(t)) if p > t && p > 0.0 => (t / p).clamp(0.0, 1.0),
        (Some(_), _) => 1.0,
        (None, _) => 0.7,
    };

    let wants_fresh = criteria.freshness.unwrap_or(false);
    let quality = criteria.quality.as_deref().map(str::to_lowercase);
    let intent = match supplier {
        Some(f) if wants_fresh || quality.is_some() => {
            let fresh_ok = !wants_fresh
                || f.products.iter().any(|p| {
                    p.is_available()
                        || p.notes.as_deref().is_some_and(|n| n.to_lowercase().contains("fresh"))
                });
            let quality_ok = quality
                .as_deref()
                .map_or(true, |q| f.products.iter().any(|p| mentions_quality(p, q)));
            if fresh_ok && quality_ok {
                1.0
            } else {
                0.5
            }
        }
        _ => 0.5,
    };

    Ok(ScoreMatchResult {
        supplier_id,
        score: round2(0.65 * proximity + 0.20 * price + 0.15 * intent),
        breakdown: MatchBreakdown {
            proximity: round2(proximity),
            price: round2(price),
            intent,
        },
        found: supplier.is_some(),
    })
}

fn cheapest_price(farmer: &Farmer) -> Option<f64> {
    farmer
        .products
        .iter()
        .filter_map(Product::unit_price)
        .min_by(f64::total_cmp)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedSpec {
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub moisture_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySpecArgs {
    pub batch_id: String,
    #[serde(default)]
    pub spec: ExpectedSpec,
}

#[derive(Debug, Serialize)]
pub struct SpecCheck {
    pub field: &'static str,
    pub expected: String,
    pub actual: Option<String>,
    pub pass: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySpecResult {
    pub batch_id: String,
    pub found: bool,
    pub checks: Vec<SpecCheck>,
    pub passed: bool,
    pub note: String,
}

pub fn verify_spec(ctx: &ToolContext, args: VerifySpecArgs) -> Result<VerifySpecResult> {
    let farmers = ctx.fixtures.farmers();
    let wanted = args.batch_id.trim();
    let listing = farmers.iter().flat_map(|f| f.products.iter()).find(|p| {
        p.id.as_ref().is_some_and(|id| id.to_string() == wanted)
            || p.display_name().eq_ignore_ascii_case(wanted)
    });

    let mut checks = Vec::new();
    if let Some(grade) = args.spec.grade.as_deref() {
        let actual = listing.and_then(|p| p.grade.clone());
        let pass = actual.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(grade));
        checks.push(SpecCheck {
            field: "grade",
            expected: grade.to_string(),
            actual,
            pass,
        });
    }
    if let Some(cert) = args.spec.certification.as_deref() {
        let actual = listing.and_then(|p| p.certification.clone());
        let pass = actual
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(&cert.to_lowercase()));
        checks.push(SpecCheck {
            field: "certification",
            expected: cert.to_string(),
            actual,
            pass,
        });
    }
    if let Some(max) = args.spec.moisture_max {
        let actual = listing.and_then(Product::moisture);
        checks.push(SpecCheck {
            field: "moistureMax",
            expected: format!("<= {}", max),
            actual: actual.map(|m| m.to_string()),
            pass: actual.is_some_and(|m| m <= max),
        });
    }

    let found = listing.is_some();
    let passed = found && checks.iter().all(|c| c.pass);
    let note = match (found, passed) {
        (false, _) => "Listing not found; ask the farmer for batch details.".to_string(),
        (true, true) => "All requested specs verified against the listing.".to_string(),
        (true, false) => {
            let failed: Vec<&str> = checks.iter().filter(|c| !c.pass).map(|c| c.field).collect();
            format!("Unverified: {}. Request certificates or samples.", failed.join(", "))
        }
    };

    Ok(VerifySpecResult {
        batch_id: args.batch_id,
        found,
        checks,
        passed,
        note,
    })
}
