//! Logistics agent: routing, pickups, stop ordering, fuel and transport risk.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::context::{new_id, ToolContext};
use crate::agent::heuristics::{is_hot_region, is_perishable, pseudo_distance, round1, round2};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::Scalar;
use crate::error::{HarvestError, Result};

/// Average road speed used for every travel-time estimate
pub const AVG_SPEED_KMH: f64 = 50.0;
const LONG_HAUL_KM: u32 = 60;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "planRoute",
                ToolCategory::Logistics,
                "Estimate travel distance, duration, and pickup window between two locations.",
            ),
            plan_route,
        )
        .register(
            ToolSpec::new(
                "schedulePickup",
                ToolCategory::Logistics,
                "Schedule a pickup slot and optionally assign a carrier.",
            ),
            schedule_pickup,
        )
        .register(
            ToolSpec::new(
                "optimizeDelivery",
                ToolCategory::Logistics,
                "Sequence delivery stops to minimise total distance.",
            ),
            optimize_delivery,
        )
        .register(
            ToolSpec::new(
                "calculateFuel",
                ToolCategory::Logistics,
                "Estimate fuel consumption and CO2 output for a delivery route.",
            ),
            calculate_fuel,
        )
        .register(
            ToolSpec::new(
                "evaluateRisk",
                ToolCategory::Logistics,
                "Assess delivery risk from distance, product type, and region.",
            ),
            evaluate_risk,
        );
}

#[derive(Debug, Deserialize)]
pub struct PlanRouteArgs {
    pub pickup: String,
    pub dropoff: String,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub quantity: Option<Scalar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub route_id: String,
    pub pickup: String,
    pub dropoff: String,
    pub distance_km: u32,
    pub duration: String,
    pub eta_hours: f64,
    pub window: &'static str,
    pub load: String,
    pub crop: String,
    pub note: &'static str,
}

fn duration_label(hours: f64) -> String {
    let whole = hours.ceil() as u64;
    if whole == 1 {
        "1 hour".to_string()
    } else {
        format!("{} hours", whole)
    }
}

pub fn plan_route(_ctx: &ToolContext, args: PlanRouteArgs) -> Result<RoutePlan> {
    let distance_km = pseudo_distance(&args.pickup, &args.dropoff);
    let hours = f64::from(distance_km) / AVG_SPEED_KMH;
    let window = if distance_km > LONG_HAUL_KM {
        "Pickup within 48 hours"
    } else {
        "Pickup within 24 hours"
    };

    Ok(RoutePlan {
        route_id: new_id("RT"),
        pickup: args.pickup,
        dropoff: args.dropoff,
        distance_km,
        duration: duration_label(hours),
        eta_hours: round1(hours),
        window,
        load: args
            .quantity
            .map(|q| q.to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| "unspecified".to_string()),
        crop: args
            .crop
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "unspecified".to_string()),
        note: "Estimated using basic distance model. optimizeDelivery can improve route efficiency.",
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePickupArgs {
    pub load_id: Scalar,
    pub pickup_time: String,
    #[serde(default)]
    pub carrier: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupConfirmation {
    pub confirmation_id: String,
    pub load_id: String,
    pub pickup_time: String,
    pub carrier: String,
    pub status: &'static str,
    pub note: &'static str,
}

/// RFC 3339, then naive date-times (as UTC), then a bare date at midnight UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn schedule_pickup(_ctx: &ToolContext, args: SchedulePickupArgs) -> Result<PickupConfirmation> {
    let when = parse_timestamp(&args.pickup_time).ok_or_else(|| {
        HarvestError::Validation(format!(
            "pickupTime '{}' is not a recognised date/time",
            args.pickup_time
        ))
    })?;

    Ok(PickupConfirmation {
        confirmation_id: new_id("PU"),
        load_id: args.load_id.to_string(),
        pickup_time: when.to_rfc3339_opts(SecondsFormat::Millis, true),
        carrier: args
            .carrier
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "Unassigned".to_string()),
        status: "scheduled",
        note: "Pickup scheduled; notify driver and farmer.",
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeDeliveryArgs {
    pub stops: Vec<Stop>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPlan {
    pub optimized: Vec<Stop>,
    pub total_distance_km: u32,
    pub est_travel_hours: f64,
    pub note: &'static str,
}

/// Greedy nearest-neighbour ordering from the first stop
pub fn nearest_neighbour(stops: Vec<Stop>) -> (Vec<Stop>, u32) {
    let mut remaining = stops;
    if remaining.is_empty() {
        return (remaining, 0);
    }
    let mut ordered = vec![remaining.remove(0)];
    let mut total = 0;
    while !remaining.is_empty() {
        let current = &ordered[ordered.len() - 1].location;
        // first minimum wins on ties
        let (best_idx, best_dist) = remaining
            .iter()
            .enumerate()
            .map(|(i, s)| (i, pseudo_distance(current, &s.location)))
            .fold((0, u32::MAX), |best, cand| if cand.1 < best.1 { cand } else { best });
        total += best_dist;
        ordered.push(remaining.remove(best_idx));
    }
    (ordered, total)
}

pub fn optimize_delivery(_ctx: &ToolContext, args: OptimizeDeliveryArgs) -> Result<DeliveryPlan> {
    if args.stops.len() < 2 {
        return Ok(DeliveryPlan {
            optimized: args.stops,
            total_distance_km: 0,
            est_travel_hours: 0.0,
            note: "Less than 2 stops.",
        });
    }
    let (optimized, total) = nearest_neighbour(args.stops);
    Ok(DeliveryPlan {
        optimized,
        total_distance_km: total,
        est_travel_hours: round1(f64::from(total) / AVG_SPEED_KMH),
        note: "Nearest-neighbour route ordering; real routing can refine this.",
    })
}

fn default_load_weight() -> f64 {
    1000.0
}

fn default_fuel_type() -> String {
    "diesel".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFuelArgs {
    pub distance_km: f64,
    #[serde(default = "default_load_weight")]
    pub load_weight: f64,
    #[serde(default = "default_fuel_type")]
    pub fuel_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelEstimate {
    pub distance_km: f64,
    pub load_weight: f64,
    pub fuel_type: String,
    pub fuel_used: f64,
    pub co2_estimate_kg: f64,
    pub note: &'static str,
}

const CO2_KG_PER_LITER: f64 = 2.68;

/// Litres (or kWh) per km; unknown types use the diesel rate
fn base_consumption(fuel_type: &str) -> f64 {
    match fuel_type.to_ascii_lowercase().as_str() {
        "petrol" => 0.30,
        "electric" => 0.12,
        _ => 0.25,
    }
}

pub fn calculate_fuel(_ctx: &ToolContext, args: CalculateFuelArgs) -> Result<FuelEstimate> {
    let load_factor = 1.0 + args.load_weight / 10_000.0;
    let fuel_used = round2(args.distance_km * base_consumption(&args.fuel_type) * load_factor);
    let co2 = if args.fuel_type.eq_ignore_ascii_case("electric") {
        0.0
    } else {
        round2(fuel_used * CO2_KG_PER_LITER)
    };

    Ok(FuelEstimate {
        distance_km: args.distance_km,
        load_weight: args.load_weight,
        fuel_type: args.fuel_type,
        fuel_used,
        co2_estimate_kg: co2,
        note: "Estimated fuel use and emissions for demo purposes.",
    })
}

fn default_risk_distance() -> f64 {
    50.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRiskArgs {
    pub crop: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default = "default_risk_distance")]
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRisk {
    pub crop: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    pub distance_km: f64,
    pub risk: &'static str,
    pub note: &'static str,
}

pub fn evaluate_risk(_ctx: &ToolContext, args: EvaluateRiskArgs) -> Result<TransportRisk> {
    let perishable = is_perishable(&args.crop);
    let hot = args.region.as_deref().is_some_and(is_hot_region);

    let risk = if perishable && args.distance_km > 80.0 {
        "high"
    } else if perishable || hot || args.distance_km > 50.0 {
        "medium"
    } else {
        "low"
    };
    let note = match risk {
        "high" => "High spoilage risk: recommend cold chain or faster pickup.",
        "medium" => "Moderate risk: schedule early morning delivery.",
        _ => "Low risk: normal transport acceptable.",
    };

    Ok(TransportRisk {
        crop: args.crop,
        region: args
            .region
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "unspecified".to_string()),
        storage_type: args.storage_type,
        distance_km: args.distance_km,
        risk,
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::empty_ctx;

    #[test]
    fn test_plan_route_window() {
        let (_dir, ctx) = empty_ctx();
        let out = plan_route(
            &ctx,
            PlanRouteArgs {
                pickup: "Kano".to_string(),
                dropoff: "Lagos".to_string(),
                crop: Some("Tomatoes".to_string()),
                quantity: Some("800 kg".into()),
            },
        )
        .unwrap();
        assert_eq!(out.distance_km, 147);
        assert_eq!(out.window, "Pickup within 48 hours");
        assert_eq!(out.duration, "3 hours");
        assert_eq!(out.eta_hours, 2.9);
        assert_eq!(out.load, "800 kg");
        assert!(out.route_id.starts_with("RT-"));

        let short = plan_route(
            &ctx,
            PlanRouteArgs {
                pickup: "Abuja".to_string(),
                dropoff: "Kano".to_string(),
                crop: None,
                quantity: None,
            },
        )
        .unwrap();
        assert_eq!(short.distance_km, 10);
        assert_eq!(short.window, "Pickup within 24 hours");
        assert_eq!(short.duration, "1 hour");
        assert_eq!(short.crop, "unspecified");
    }

    #[test]
    fn test_schedule_pickup_normalises_time() {
        let (_dir, ctx) = empty_ctx();
        let out = schedule_pickup(
            &ctx,
            SchedulePickupArgs {
                load_id: "LOT-123".into(),
                pickup_time: "2025-11-03T10:00:00+01:00".to_string(),
                carrier: None,
            },
        )
        .unwrap();
        assert_eq!(out.pickup_time, "2025-11-03T09:00:00.000Z");
        assert_eq!(out.carrier, "Unassigned");
        assert!(out.confirmation_id.starts_with("PU-"));

        let date_only = parse_timestamp("2025-11-03").unwrap();
        assert_eq!(date_only.to_rfc3339_opts(SecondsFormat::Secs, true), "2025-11-03T00:00:00Z");
    }

    #[test]
    fn test_schedule_pickup_rejects_garbage() {
        let (_dir, ctx) = empty_ctx();
        let err = schedule_pickup(
            &ctx,
            SchedulePickupArgs {
                load_id: Scalar::Number(1.0),
                pickup_time: "tomorrow-ish".to_string(),
                carrier: None,
            },
        )
        .unwrap_err();
        assert!(err.is_client_error());
    }

    fn stop(name: &str, location: &str) -> Stop {
        Stop {
            name: Some(name.to_string()),
            location: location.to_string(),
        }
    }

    #[test]
    fn test_optimize_delivery_nearest_neighbour() {
        let (_dir, ctx) = empty_ctx();
        let out = optimize_delivery(
            &ctx,
            OptimizeDeliveryArgs {
                stops: vec![stop("Farm A", "Kano"), stop("Buyer", "Lagos"), stop("Farm B", "Abuja")],
            },
        )
        .unwrap();
        let order: Vec<&str> = out.optimized.iter().map(|s| s.location.as_str()).collect();
        // Kano->Abuja 88, Abuja->Lagos 21
        assert_eq!(order, vec!["Kano", "Abuja", "Lagos"]);
        assert_eq!(out.total_distance_km, 109);
        assert_eq!(out.est_travel_hours, 2.2);
    }

    #[test]
    fn test_optimize_delivery_single_stop() {
        let (_dir, ctx) = empty_ctx();
        let out = optimize_delivery(
            &ctx,
            OptimizeDeliveryArgs {
                stops: vec![stop("Only", "Kano")],
            },
        )
        .unwrap();
        assert_eq!(out.optimized.len(), 1);
        assert_eq!(out.total_distance_km, 0);
        assert_eq!(out.note, "Less than 2 stops.");
    }

    #[test]
    fn test_calculate_fuel() {
        let (_dir, ctx) = empty_ctx();
        let diesel = calculate_fuel(
            &ctx,
            CalculateFuelArgs {
                distance_km: 100.0,
                load_weight: 2000.0,
                fuel_type: "diesel".to_string(),
            },
        )
        .unwrap();
        assert_eq!(diesel.fuel_used, 30.0);
        assert_eq!(diesel.co2_estimate_kg, 80.4);

        let electric = calculate_fuel(
            &ctx,
            CalculateFuelArgs {
                distance_km: 100.0,
                load_weight: 0.0,
                fuel_type: "electric".to_string(),
            },
        )
        .unwrap();
        assert_eq!(electric.fuel_used, 12.0);
        assert_eq!(electric.co2_estimate_kg, 0.0);
    }

    #[test]
    fn test_evaluate_risk_levels() {
        let (_dir, ctx) = empty_ctx();
        let risk = |crop: &str, region: Option<&str>, d: f64| {
            evaluate_risk(
                &ctx,
                EvaluateRiskArgs {
                    crop: crop.to_string(),
                    region: region.map(str::to_string),
                    storage_type: None,
                    distance_km: d,
                },
            )
            .unwrap()
            .risk
        };
        assert_eq!(risk("Tomatoes", Some("Nigeria"), 120.0), "high");
        assert_eq!(risk("Tomatoes", None, 30.0), "medium");
        assert_eq!(risk("Maize", Some("Kenya"), 10.0), "medium");
        assert_eq!(risk("Maize", Some("Germany"), 10.0), "low");
        assert_eq!(risk("Kale", None, 40.0), "low");
    }
}
