//! Risk agent: price volatility, delivery delay, factor roll-ups, mitigation.

use serde::{Deserialize, Serialize};

use super::{collect_prices, open_listings};
use crate::agent::context::ToolContext;
use crate::agent::heuristics::{is_hot_region, is_perishable, mean, median, round1, round2, std_dev};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::error::Result;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "priceVolatility",
                ToolCategory::Risk,
                "Estimate recent price volatility and trend for a crop/region.",
            ),
            price_volatility,
        )
        .register(
            ToolSpec::new(
                "deliveryDelayRisk",
                ToolCategory::Risk,
                "Heuristic risk of delivery delay based on distance and mode.",
            ),
            delivery_delay_risk,
        )
        .register(
            ToolSpec::new(
                "aggregateRisk",
                ToolCategory::Risk,
                "Combine multiple risk factors into a single score and label.",
            ),
            aggregate_risk,
        )
        .register(
            ToolSpec::new(
                "recommendMitigation",
                ToolCategory::Risk,
                "Suggest concrete mitigation actions from risk context.",
            ),
            recommend_mitigation,
        );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// low < 0.34 <= medium < 0.67 <= high
    pub fn from_score(score: f64) -> Self {
        if score >= 0.67 {
            RiskLevel::High
        } else if score >= 0.34 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

fn default_period() -> String {
    "30d".to_string()
}

#[derive(Debug, Deserialize)]
pub struct VolatilityArgs {
    pub crop: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_period")]
    pub period: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityResult {
    pub crop: String,
    pub region: String,
    pub period: String,
    pub samples: usize,
    pub volatility_pct: Option<f64>,
    pub trend: &'static str,
    pub label: &'static str,
}

pub fn price_volatility(ctx: &ToolContext, args: VolatilityArgs) -> Result<VolatilityResult> {
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let farmers = ctx.fixtures.farmers();
    let listings = open_listings(&farmers, region, &args.crop.to_lowercase());
    let prices = collect_prices(&listings);

    let (volatility_pct, trend, label) = match (mean(&prices), median(&prices), std_dev(&prices)) {
        (Some(avg), Some(mid), Some(sd)) if avg > 0.0 => {
            let cv = round2(sd / avg * 100.0);
            // mean pulled above the median by recent high asks reads as rising
            let trend = if avg > mid * 1.05 {
                "rising"
            } else if avg < mid * 0.95 {
                "falling"
            } else {
                "stable"
            };
            let label = if cv < 10.0 {
                "low"
            } else if cv < 25.0 {
                "medium"
            } else {
                "high"
            };
            (Some(cv), trend, label)
        }
        _ => (None, "unknown", "unknown"),
    };

    Ok(VolatilityResult {
        crop: args.crop,
        region: region.unwrap_or("all").to_string(),
        period: args.period,
        samples: prices.len(),
        volatility_pct,
        trend,
        label,
    })
}

fn default_mode() -> String {
    "truck".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayArgs {
    pub distance_km: f64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub window_hours: Option<f64>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayResult {
    pub distance_km: f64,
    pub mode: String,
    pub travel_hours: f64,
    pub window_hours: f64,
    pub delay_risk_pct: f64,
    pub level: RiskLevel,
    pub note: &'static str,
}

const DEFAULT_WINDOW_HOURS: f64 = 24.0;

fn mode_speed_kmh(mode: &str) -> f64 {
    match mode.to_ascii_lowercase().as_str() {
        "bike" => 15.0,
        "van" => 45.0,
        "lorry" => 40.0,
        _ => 50.0,
    }
}

pub fn delivery_delay_risk(_ctx: &ToolContext, args: DelayArgs) -> Result<DelayResult> {
    let distance = args.distance_km.max(0.0);
    let travel_hours = distance / mode_speed_kmh(&args.mode);
    let window = args.window_hours.filter(|w| *w > 0.0).unwrap_or(DEFAULT_WINDOW_HOURS);

    let mut risk = (travel_hours / window) * 0.8;
    if args.region.as_deref().is_some_and(is_hot_region) {
        risk += 0.1;
    }
    if args.mode.eq_ignore_ascii_case("bike") && distance > 30.0 {
        risk += 0.05;
    }
    let risk = risk.clamp(0.0, 0.95);
    let level = RiskLevel::from_score(risk);

    Ok(DelayResult {
        distance_km: distance,
        mode: args.mode,
        travel_hours: round1(travel_hours),
        window_hours: window,
        delay_risk_pct: round1(risk * 100.0),
        level,
        note: match level {
            RiskLevel::High => "Window is tight for this mode; dispatch earlier or switch vehicle.",
            RiskLevel::Medium => "Some slack; confirm the driver before loading.",
            RiskLevel::Low => "Comfortable window.",
        },
    })
}

fn default_weight() -> f64 {
    0.25
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub score: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct AggregateArgs {
    pub factors: Vec<RiskFactor>,
}

#[derive(Debug, Serialize)]
pub struct FactorContribution {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Serialize)]
pub struct AggregateResult {
    pub score: f64,
    pub level: RiskLevel,
    pub dominant: Option<String>,
    pub factors: Vec<FactorContribution>,
}

pub fn aggregate_risk(_ctx: &ToolContext, args: AggregateArgs) -> Result<AggregateResult> {
    let total_weight: f64 = args.factors.iter().map(|f| f.weight.max(0.0)).sum();
    let factors: Vec<FactorContribution> = args
        .factors
        .into_iter()
        .map(|f| {
            let weight = f.weight.max(0.0);
            let contribution = if total_weight > 0.0 {
                f.score * weight / total_weight
            } else {
                0.0
            };
            FactorContribution {
                name: f.name,
                score: f.score,
                weight,
                contribution: round2(contribution),
            }
        })
        .collect();

    let raw: f64 = if total_weight > 0.0 {
        factors.iter().map(|f| f.score * f.weight).sum::<f64>() / total_weight
    } else {
        0.0
    };
    let score = round2(raw.clamp(0.0, 1.0));
    let dominant = factors
        .iter()
        .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
        .map(|f| f.name.clone());

    Ok(AggregateResult {
        score,
        level: RiskLevel::from_score(score),
        dominant,
        factors,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationContext {
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub volatility_pct: Option<f64>,
    #[serde(default)]
    pub delay_risk_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationArgs {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub context: MitigationContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationPlan {
    pub risk_level: RiskLevel,
    pub crop: Option<String>,
    pub priority: &'static str,
    pub actions: Vec<&'static str>,
}

pub fn recommend_mitigation(_ctx: &ToolContext, args: MitigationArgs) -> Result<MitigationPlan> {
    let ctx = &args.context;
    let mut actions = match args.risk_level {
        RiskLevel::High => vec![
            "Move pickup forward and confirm the buyer before harvest.",
            "Insure or pre-sell part of the lot.",
        ],
        RiskLevel::Medium => vec!["Schedule early-morning loading and confirm transport a day ahead."],
        RiskLevel::Low => vec!["Proceed with standard handling; monitor prices weekly."],
    };

    let perishable = args.crop.as_deref().is_some_and(is_perishable);
    let cold = ctx
        .storage_type
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains("cold"));
    if perishable && !cold {
        actions.push("Use cold storage or pre-cooling before transport.");
    }
    if ctx.distance_km.is_some_and(|d| d > 80.0) {
        actions.push("Split the route into shorter legs or use a co-op hub.");
    }
    if ctx.volatility_pct.is_some_and(|v| v > 20.0) {
        actions.push("Lock a forward price with the buyer.");
    }
    if ctx.delay_risk_pct.is_some_and(|d| d > 50.0) {
        actions.push("Add a buffer to the delivery window.");
    }

    Ok(MitigationPlan {
        risk_level: args.risk_level,
        crop: args.crop,
        priority: match args.risk_level {
            RiskLevel::High => "immediate",
            RiskLevel::Medium => "planned",
            RiskLevel::Low => "monitor",
        },
        actions,
    })
}
