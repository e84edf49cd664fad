//! Co-op agent: pool small farmers into lots large enough for bulk buyers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{farmer_distance, for_each_listing};
use crate::agent::context::{new_id, ToolContext};
use crate::agent::heuristics::{mean, parse_qty_kg, round2};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::{Farmer, Scalar};
use crate::error::Result;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "groupByCrop",
                ToolCategory::Coop,
                "Cluster nearby farmers listing the same crop.",
            ),
            group_by_crop,
        )
        .register(
            ToolSpec::new(
                "analyzeVolume",
                ToolCategory::Coop,
                "Combined volume, contributions, and gap against a target quantity.",
            ),
            analyze_volume,
        )
        .register(
            ToolSpec::new(
                "createBulkLot",
                ToolCategory::Coop,
                "Create a provisional cooperative lot for a buyer.",
            ),
            create_bulk_lot,
        );
}

fn default_max_distance() -> f64 {
    150.0
}

/// Unsold kilograms of `crop_lower` listed by one farmer
fn crop_volume_kg(farmer: &Farmer, crop_lower: &str) -> f64 {
    farmer
        .products
        .iter()
        .filter(|p| p.name_contains(crop_lower) && !p.is_sold())
        .map(|p| parse_qty_kg(&p.quantity_text()))
        .sum()
}

fn id_set(ids: &[Scalar]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupArgs {
    pub crop: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_max_distance")]
    pub max_distance_km: f64,
    #[serde(default)]
    pub min_qty: Option<Scalar>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub farmer_id: String,
    pub farmer_name: String,
    pub location: String,
    pub product: String,
    pub quantity: String,
    pub qty_kg: f64,
    pub distance_km: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub crop: String,
    pub members: Vec<GroupMember>,
    pub total_qty_kg: f64,
    pub note: &'static str,
}

pub fn group_by_crop(ctx: &ToolContext, args: GroupArgs) -> Result<GroupResult> {
    let farmers = ctx.fixtures.farmers();
    let crop = args.crop.to_lowercase();
    let location = args.location.as_deref().filter(|l| !l.is_empty());
    let min_kg = args
        .min_qty
        .as_ref()
        .map(|q| parse_qty_kg(&q.to_string()))
        .unwrap_or(0.0);
    let quality = args.quality.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty());

    let mut members = Vec::new();
    for_each_listing(&farmers, None, |farmer, product| {
        if !product.name_contains(&crop) || product.is_sold() {
            return;
        }
        let dist = farmer_distance(location, farmer);
        if location.is_some() && f64::from(dist) > args.max_distance_km {
            return;
        }
        let qty_kg = parse_qty_kg(&product.quantity_text());
        if qty_kg < min_kg {
            return;
        }
        if let Some(q) = quality.as_deref() {
            let tagged = [&product.notes, &product.certification, &product.grade]
                .into_iter()
                .flatten()
                .any(|v| v.to_lowercase().contains(q));
            if !tagged {
                return;
            }
        }
        members.push(GroupMember {
            farmer_id: farmer.identifier(),
            farmer_name: farmer.display_name(),
            location: farmer.display_location(),
            product: product.display_name().to_string(),
            quantity: product.quantity_text(),
            qty_kg,
            distance_km: dist,
        });
    });
    members.sort_by_key(|m| m.distance_km);

    let total = round2(members.iter().map(|m| m.qty_kg).sum());
    Ok(GroupResult {
        crop: args.crop,
        note: if members.len() > 1 {
            "Members can pool volume; run analyzeVolume against the buyer target."
        } else {
            "Not enough nearby growers to form a group; widen the distance."
        },
        members,
        total_qty_kg: total,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeArgs {
    pub farmer_ids: Vec<Scalar>,
    pub target_qty: Scalar,
    pub crop: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub farmer_id: String,
    pub farmer_name: String,
    pub qty_kg: f64,
    pub share_pct: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResult {
    pub crop: String,
    pub target_kg: f64,
    pub combined_kg: f64,
    pub gap_kg: f64,
    pub coverage_pct: f64,
    pub meets_target: bool,
    pub contributions: Vec<Contribution>,
    pub unknown_ids: Vec<String>,
}

pub fn analyze_volume(ctx: &ToolContext, args: VolumeArgs) -> Result<VolumeResult> {
    let farmers = ctx.fixtures.farmers();
    let crop = args.crop.to_lowercase();
    let target_kg = parse_qty_kg(&args.target_qty.to_string());

    let mut contributions = Vec::new();
    let mut unknown_ids = Vec::new();
    for id in id_set(&args.farmer_ids) {
        match farmers.iter().find(|f| f.identifier() == id) {
            Some(farmer) => contributions.push(Contribution {
                farmer_id: id,
                farmer_name: farmer.display_name(),
                qty_kg: crop_volume_kg(farmer, &crop),
                share_pct: 0.0,
            }),
            None => unknown_ids.push(id),
        }
    }

    let combined: f64 = contributions.iter().map(|c| c.qty_kg).sum();
    for c in &mut contributions {
        c.share_pct = if combined > 0.0 {
            round2(c.qty_kg / combined * 100.0)
        } else {
            0.0
        };
    }
    let coverage = if target_kg > 0.0 {
        round2(combined / target_kg * 100.0)
    } else {
        0.0
    };

    Ok(VolumeResult {
        crop: args.crop,
        target_kg,
        combined_kg: round2(combined),
        gap_kg: round2((target_kg - combined).max(0.0)),
        coverage_pct: coverage,
        meets_target: target_kg > 0.0 && combined >= target_kg,
        contributions,
        unknown_ids,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLotArgs {
    pub farmer_ids: Vec<Scalar>,
    pub crop: String,
    pub total_qty: Scalar,
    #[serde(default)]
    pub buyer_id: Option<String>,
    #[serde(default)]
    pub blended_price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLot {
    pub lot_id: String,
    pub crop: String,
    pub farmer_ids: Vec<String>,
    pub total_qty: String,
    pub total_qty_kg: f64,
    pub buyer_id: Option<String>,
    pub blended_price: Option<f64>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub next_steps: Vec<&'static str>,
}

pub fn create_bulk_lot(ctx: &ToolContext, args: BulkLotArgs) -> Result<BulkLot> {
    let farmer_ids = id_set(&args.farmer_ids);
    let crop = args.crop.to_lowercase();

    // without an agreed price, quote the members' average ask
    let blended_price = args.blended_price.or_else(|| {
        let farmers = ctx.fixtures.farmers();
        let asks: Vec<f64> = farmers
            .iter()
            .filter(|f| farmer_ids.contains(&f.identifier()))
            .flat_map(|f| f.products.iter())
            .filter(|p| p.name_contains(&crop))
            .filter_map(|p| p.unit_price())
            .collect();
        mean(&asks).map(round2)
    });

    let total_qty = args.total_qty.to_string();
    Ok(BulkLot {
        lot_id: new_id("LOT"),
        total_qty_kg: parse_qty_kg(&total_qty),
        crop: args.crop,
        farmer_ids,
        total_qty,
        buyer_id: args.buyer_id,
        blended_price,
        status: "provisional",
        created_at: Utc::now(),
        next_steps: vec![
            "Confirm each member's committed quantity.",
            "Agree a single grading standard for the lot.",
            "Plan a consolidated pickup route.",
        ],
    })
}
