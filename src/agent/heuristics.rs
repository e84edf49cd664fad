//! Shared arithmetic for the tool handlers.

use regex::Regex;
use std::sync::LazyLock;

static QTY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d.]+").expect("static regex"));

/// Deterministic stand-in for road distance between two place names.
///
/// Java-style string hash over UTF-16 code units with 32-bit wrapping,
/// folded into 10..=209 km.
pub fn pseudo_distance(a: &str, b: &str) -> u32 {
    let joined = format!("{}|{}", a, b);
    let mut h: i32 = 0;
    for unit in joined.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    (h % 200).unsigned_abs() + 10
}

/// Leading magnitude of a free-text quantity ("250 kg" -> 250). 0 when absent.
pub fn parse_qty(text: &str) -> f64 {
    QTY_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Like [`parse_qty`] but converts tons to kilograms
pub fn parse_qty_kg(text: &str) -> f64 {
    let q = parse_qty(text);
    let lower = text.to_lowercase();
    if lower.contains("ton") || lower.split_whitespace().any(|w| w == "t") {
        q * 1000.0
    } else {
        q
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Low/median/high cut points taken from the sorted sample.
///
/// low = sorted[max(0, floor(n/4) - 1)], high = sorted[min(n - 1, floor(3n/4))]
pub fn quartile_bands(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let low_idx = ((n as f64 * 0.25).floor() as usize).saturating_sub(1);
    let high_idx = ((n as f64 * 0.75).floor() as usize).min(n - 1);
    let mid = median(&sorted)?;
    Some((sorted[low_idx], mid, sorted[high_idx]))
}

const PERISHABLE_CROPS: &[&str] = &["tomato", "strawberry", "avocado", "greens", "grape"];
const HOT_REGIONS: &[&str] = &["kenya", "ghana", "nigeria", "india"];

/// Crops that spoil within days without cooling
pub fn is_perishable(crop: &str) -> bool {
    let crop = crop.to_lowercase();
    PERISHABLE_CROPS.iter().any(|p| crop.contains(p))
}

pub fn is_hot_region(region: &str) -> bool {
    let region = region.to_lowercase();
    HOT_REGIONS.iter().any(|r| region.contains(r))
}

/// Percent change of `current` over `prior`; 0 when prior is 0
pub fn pct_change(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        0.0
    } else {
        (current - prior) / prior * 100.0
    }
}

/// First `max` characters, never splitting a code point
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
