//! Barter agent: partner discovery, trade valuation, provisional exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{farmer_distance, for_each_listing};
use crate::agent::context::{new_id, ToolContext};
use crate::agent::heuristics::{parse_qty, round2};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::{Farmer, Scalar};
use crate::error::Result;

const MAX_MATCHES: usize = 10;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "findBarterMatch",
                ToolCategory::Barter,
                "Find compatible barter partners by crop, quantity, and proximity.",
            ),
            find_barter_match,
        )
        .register(
            ToolSpec::new(
                "evaluateTradeValue",
                ToolCategory::Barter,
                "Estimate a fair barter ratio using reference prices.",
            ),
            evaluate_trade_value,
        )
        .register(
            ToolSpec::new(
                "initiateExchange",
                ToolCategory::Barter,
                "Open a provisional barter exchange with a partner.",
            ),
            initiate_exchange,
        );
}

fn default_max_distance() -> f64 {
    150.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindBarterArgs {
    pub item_offered: String,
    pub item_wanted: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_max_distance")]
    pub max_distance_km: f64,
    #[serde(default)]
    pub min_quantity: Option<Scalar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarterMatch {
    pub partner_id: String,
    pub partner_name: String,
    pub partner_location: String,
    pub product_name: String,
    pub quantity: String,
    pub distance_km: u32,
    pub wants_offered: bool,
    pub score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarterRequested {
    pub item_wanted: String,
    pub min_quantity: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarterOffered {
    pub item_offered: String,
}

#[derive(Debug, Serialize)]
pub struct FindBarterResult {
    pub requested: BarterRequested,
    pub offered: BarterOffered,
    pub matches: Vec<BarterMatch>,
    pub note: &'static str,
}

/// Whether any of the farmer's wants overlaps the offered item
fn wants_offered(farmer: &Farmer, offered_lower: &str) -> bool {
    farmer.wants.iter().map(|w| w.to_lowercase()).any(|w| {
        !w.is_empty() && (offered_lower.contains(&w) || w.contains(offered_lower))
    })
}

pub fn find_barter_match(ctx: &ToolContext, args: FindBarterArgs) -> Result<FindBarterResult> {
    let farmers = ctx.fixtures.farmers();
    let offered = args.item_offered.to_lowercase();
    let wanted = args.item_wanted.to_lowercase();
    let min_qty = args
        .min_quantity
        .as_ref()
        .map(|q| parse_qty(&q.to_string()))
        .unwrap_or(0.0);
    let location = args.location.as_deref().filter(|l| !l.is_empty());
    let max_distance = args.max_distance_km.max(1.0);

    let mut matches = Vec::new();
    for_each_listing(&farmers, None, |farmer, product| {
        if !product.name_contains(&wanted) {
            return;
        }
        let dist = farmer_distance(location, farmer);
        if location.is_some() && f64::from(dist) > args.max_distance_km {
            return;
        }
        if min_qty > 0.0 && parse_qty(&product.quantity_text()) < min_qty {
            return;
        }

        let wants = wants_offered(farmer, &offered);
        let price_known = if product.unit_price().is_some() { 1.0 } else { 0.7 };
        let proximity = match location {
            Some(_) => 1.0 - (f64::from(dist) / max_distance).min(1.0),
            None => 1.0,
        };
        let intent = if wants { 1.0 } else { 0.5 };

        matches.push(BarterMatch {
            partner_id: farmer.identifier(),
            partner_name: farmer.display_name(),
            partner_location: farmer.display_location(),
            product_name: product.display_name().to_string(),
            quantity: product.quantity_text(),
            distance_km: dist,
            wants_offered: wants,
            score: round2(0.65 * proximity + 0.20 * price_known + 0.15 * intent),
        });
    });

    // stable sort keeps fixture order among equal scores
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    let note = if matches.is_empty() {
        "No matches. Try a wider distance or lower minimum quantity."
    } else {
        "Top matches ranked by distance, price reference, and partner interest."
    };
    matches.truncate(MAX_MATCHES);

    Ok(FindBarterResult {
        requested: BarterRequested {
            item_wanted: args.item_wanted,
            min_quantity: args.min_quantity.map(|q| q.to_string()),
            location: location.map(str::to_string),
        },
        offered: BarterOffered {
            item_offered: args.item_offered,
        },
        matches,
        note,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeItem {
    pub name: String,
    pub qty: Scalar,
    #[serde(default)]
    pub ref_price_per_unit: Option<f64>,
}

impl TradeItem {
    fn value(&self) -> f64 {
        parse_qty(&self.qty.to_string()) * self.ref_price_per_unit.unwrap_or(1.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeValueArgs {
    pub items_a: Vec<TradeItem>,
    pub items_b: Vec<TradeItem>,
}

#[derive(Debug, Serialize)]
pub struct PartyTotal {
    pub total: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeValueResult {
    pub party_a: PartyTotal,
    pub party_b: PartyTotal,
    #[serde(rename = "proposedRatioAtoB")]
    pub proposed_ratio_a_to_b: Option<f64>,
    pub fairness: &'static str,
    pub note: &'static str,
}

pub fn fairness_label(ratio: Option<f64>) -> &'static str {
    match ratio {
        None => "unknown",
        Some(r) if r > 1.15 => "A offers more value",
        Some(r) if r < 0.85 => "B offers more value",
        Some(_) => "balanced",
    }
}

pub fn evaluate_trade_value(_ctx: &ToolContext, args: TradeValueArgs) -> Result<TradeValueResult> {
    let total = |items: &[TradeItem]| round2(items.iter().map(TradeItem::value).sum());
    let value_a = total(&args.items_a);
    let value_b = total(&args.items_b);
    let ratio = (value_b != 0.0).then(|| round2(value_a / value_b));

    Ok(TradeValueResult {
        party_a: PartyTotal { total: value_a },
        party_b: PartyTotal { total: value_b },
        proposed_ratio_a_to_b: ratio,
        fairness: fairness_label(ratio),
        note: "Guidance only; adjust for quality, perishability, and transport.",
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTerms {
    pub offered: String,
    pub requested: String,
    pub ratio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_b: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateExchangeArgs {
    pub partner_id: Scalar,
    pub terms: ExchangeTerms,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeContract {
    pub exchange_id: String,
    pub partner_id: String,
    pub terms: ExchangeTerms,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub next_steps: Vec<&'static str>,
}

pub fn initiate_exchange(_ctx: &ToolContext, args: InitiateExchangeArgs) -> Result<ExchangeContract> {
    Ok(ExchangeContract {
        exchange_id: new_id("BX"),
        partner_id: args.partner_id.to_string(),
        terms: args.terms,
        status: "provisional",
        created_at: Utc::now(),
        next_steps: vec![
            "Confirm quantities and units for both sides.",
            "Pick a pickup/delivery window and location.",
            "Optionally plan route (Logistics) and check spoilage risk (Risk).",
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::{ctx_with_farmers, empty_ctx};
    use serde_json::json;

    fn item(name: &str, qty: &str, price: Option<f64>) -> TradeItem {
        TradeItem {
            name: name.to_string(),
            qty: qty.into(),
            ref_price_per_unit: price,
        }
    }

    #[test]
    fn test_trade_value_symmetry() {
        let (_dir, ctx) = empty_ctx();
        let a = vec![item("Tomatoes", "100 kg", Some(1.2))];
        let b = vec![item("Onions", "80 kg", Some(0.9)), item("Garlic", "5 kg", None)];

        let ab = evaluate_trade_value(
            &ctx,
            TradeValueArgs {
                items_a: a.clone(),
                items_b: b.clone(),
            },
        )
        .unwrap();
        let ba = evaluate_trade_value(&ctx, TradeValueArgs { items_a: b, items_b: a }).unwrap();

        assert_eq!(ab.party_a.total, 120.0);
        assert_eq!(ab.party_b.total, 77.0);
        assert_eq!(ab.party_a.total, ba.party_b.total);
        assert_eq!(ab.party_b.total, ba.party_a.total);
        assert_eq!(ab.proposed_ratio_a_to_b, Some(round2(120.0 / 77.0)));
        assert_eq!(ba.proposed_ratio_a_to_b, Some(round2(77.0 / 120.0)));
        assert_eq!(ab.fairness, "A offers more value");
        assert_eq!(ba.fairness, "B offers more value");
    }

    #[test]
    fn test_trade_value_empty_side() {
        let (_dir, ctx) = empty_ctx();
        let out = evaluate_trade_value(
            &ctx,
            TradeValueArgs {
                items_a: vec![item("Maize", "10", None)],
                items_b: vec![],
            },
        )
        .unwrap();
        assert_eq!(out.proposed_ratio_a_to_b, None);
        assert_eq!(out.fairness, "unknown");
        assert_eq!(fairness_label(Some(1.0)), "balanced");
    }

    #[test]
    fn test_find_barter_match_ranks_interest() {
        let (_dir, ctx) = ctx_with_farmers(json!([
            {"id": "f1", "name": "Ade", "location": "Kano",
             "products": [{"name": "Onions", "qty": "300 kg"}]},
            {"id": "f2", "name": "Bisi", "location": "Kano", "wants": ["tomatoes"],
             "products": [{"name": "Red Onions", "qty": "300 kg", "price": 1.1}]},
            {"id": "f3", "name": "Chi", "location": "Kano",
             "products": [{"name": "Onions", "qty": "20 kg"}]}
        ]));
        let out = find_barter_match(
            &ctx,
            FindBarterArgs {
                item_offered: "Tomatoes".to_string(),
                item_wanted: "onions".to_string(),
                location: None,
                max_distance_km: 150.0,
                min_quantity: Some("100 kg".into()),
            },
        )
        .unwrap();
        assert_eq!(out.matches.len(), 2);
        assert_eq!(out.matches[0].partner_id, "f2");
        assert!(out.matches[0].wants_offered);
        // 0.65 + 0.20 + 0.15
        assert_eq!(out.matches[0].score, 1.0);
        // 0.65 + 0.14 + 0.075
        assert_eq!(out.matches[1].score, 0.87);
    }

    #[test]
    fn test_find_barter_match_empty_note() {
        let (_dir, ctx) = ctx_with_farmers(json!([]));
        let out = find_barter_match(
            &ctx,
            FindBarterArgs {
                item_offered: "Tomatoes".to_string(),
                item_wanted: "Teff".to_string(),
                location: Some("Kano".to_string()),
                max_distance_km: 150.0,
                min_quantity: None,
            },
        )
        .unwrap();
        assert!(out.matches.is_empty());
        assert!(out.note.starts_with("No matches"));
    }

    #[test]
    fn test_initiate_exchange_is_provisional() {
        let (_dir, ctx) = empty_ctx();
        let out = initiate_exchange(
            &ctx,
            InitiateExchangeArgs {
                partner_id: Scalar::Number(7.0),
                terms: ExchangeTerms {
                    offered: "100 kg tomatoes".to_string(),
                    requested: "80 kg onions".to_string(),
                    ratio: "1:0.8".to_string(),
                    pickup_window: None,
                    location_a: None,
                    location_b: None,
                },
            },
        )
        .unwrap();
        assert!(out.exchange_id.starts_with("BX-"));
        assert_eq!(out.partner_id, "7");
        assert_eq!(out.status, "provisional");
        assert_eq!(out.next_steps.len(), 3);
    }
}
