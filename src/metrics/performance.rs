//! Performance aggregation - power, weight, gearing and tier

use serde::{Deserialize, Serialize};

use crate::entities::build::{PowerSource, PowerSourceType};
use crate::entities::engine::Engine;
use crate::entities::motor::Motor;
use crate::entities::part::{Part, PartCategory};

/// Weight of a bare kart (frame, seat, driver excluded) used for power-to-weight
pub const DEFAULT_BASE_KART_WEIGHT_LBS: f64 = 100.0;

/// Spec keys carrying a driver (clutch / torque converter) tooth count
const DRIVER_TEETH_KEYS: &[&str] = &["teeth", "sprocket_teeth", "driver_teeth"];

/// Spec keys carrying an overall tire diameter in inches
const TIRE_DIAMETER_KEYS: &[&str] = &["diameter", "diameter_in", "tire_diameter"];

/// Governed speed of a stock small engine
pub const STOCK_ENGINE_RPM: f64 = 3600.0;

const INCHES_PER_MILE: f64 = 12.0 * 5280.0;

/// Discrete performance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceTier {
    EntryLevel,
    MidRange,
    HighPerformance,
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceTier::EntryLevel => write!(f, "Entry-Level"),
            PerformanceTier::MidRange => write!(f, "Mid-Range"),
            PerformanceTier::HighPerformance => write!(f, "High Performance"),
        }
    }
}

/// Advisory text attached to a tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    pub tier: PerformanceTier,
    pub recommended_ratio: String,
    pub top_speed: String,
    /// Suggested clutch and axle sprockets (gas only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprockets: Option<String>,
    /// Suggested battery capacity (electric only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
}

impl TierProfile {
    /// Gas tiers, keyed on total horsepower
    pub fn gas(hp: f64) -> Self {
        let (tier, ratio, speed, sprockets) = if hp < 6.0 {
            (PerformanceTier::EntryLevel, "5:1", "25-30 mph", "10T + 50T")
        } else if hp < 10.0 {
            (PerformanceTier::MidRange, "6:1", "35-45 mph", "12T + 72T")
        } else {
            (PerformanceTier::HighPerformance, "7:1", "45-55+ mph", "12T + 84T")
        };
        Self {
            tier,
            recommended_ratio: ratio.to_string(),
            top_speed: speed.to_string(),
            sprockets: Some(sprockets.to_string()),
            battery: None,
        }
    }

    /// Electric tiers, keyed on motor horsepower
    pub fn electric(hp: f64) -> Self {
        let (tier, ratio, speed, battery) = if hp < 5.0 {
            (PerformanceTier::EntryLevel, "5:1", "30-35 mph", "10-15 Ah")
        } else if hp < 10.0 {
            (PerformanceTier::MidRange, "6:1", "35-45 mph", "20-30 Ah")
        } else {
            (PerformanceTier::HighPerformance, "7:1", "45-55+ mph", "40+ Ah")
        };
        Self {
            tier,
            recommended_ratio: ratio.to_string(),
            top_speed: speed.to_string(),
            sprockets: None,
            battery: Some(battery.to_string()),
        }
    }
}

/// Aggregated build performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_type: Option<PowerSourceType>,

    pub total_hp: f64,
    pub total_torque: f64,
    pub total_weight_lbs: f64,

    /// Axle sprocket teeth / driver teeth; `None` when any input is missing
    pub gear_ratio: Option<f64>,

    /// Speed at governed engine rpm through the gear ratio and rear tire
    pub top_speed_mph: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierProfile>,

    /// HP per 100 lb, including the base kart weight
    pub power_to_weight: Option<f64>,

    /// Rough 0-20 mph time in seconds
    pub zero_to_twenty_secs: Option<f64>,

    /// Rough 0-30 mph time in seconds
    pub zero_to_thirty_secs: Option<f64>,

    /// Sum of known prices (power source and parts)
    pub total_cost: f64,
}

/// Aggregator settings
#[derive(Debug, Clone, Copy)]
pub struct PerformanceOptions {
    pub base_kart_weight_lbs: f64,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            base_kart_weight_lbs: DEFAULT_BASE_KART_WEIGHT_LBS,
        }
    }
}

/// Compute metrics from an optional engine or motor.
///
/// If both are given the engine is used.
pub fn compute_build_metrics(engine: Option<&Engine>, motor: Option<&Motor>, parts: &[Part]) -> BuildMetrics {
    if engine.is_some() && motor.is_some() {
        tracing::warn!("both an engine and a motor were supplied; using the engine");
    }
    let power = engine
        .cloned()
        .map(PowerSource::Engine)
        .or_else(|| motor.cloned().map(PowerSource::Motor));
    compute_metrics(power.as_ref(), parts, &PerformanceOptions::default())
}

/// Compute metrics for a power source and parts
pub fn compute_metrics(
    power: Option<&PowerSource>,
    parts: &[Part],
    options: &PerformanceOptions,
) -> BuildMetrics {
    let base_hp = power.map_or(0.0, PowerSource::horsepower);
    let base_torque = match power {
        Some(PowerSource::Engine(e)) => match e.torque {
            Some(t) if t > 0.0 => t,
            // Rough peak torque from horsepower at governed rpm
            _ => round_to(e.horsepower * 5252.0 / STOCK_ENGINE_RPM, 1),
        },
        Some(PowerSource::Motor(m)) => m.torque_lbft.unwrap_or(0.0),
        None => 0.0,
    };
    let base_weight = power.and_then(PowerSource::weight_lbs).unwrap_or(0.0);

    let total_hp = base_hp + parts.iter().map(|p| contribution(p, "hp_contribution")).sum::<f64>();
    let total_torque =
        base_torque + parts.iter().map(|p| contribution(p, "torque_contribution")).sum::<f64>();
    let total_weight_lbs = base_weight + parts.iter().map(part_weight).sum::<f64>();

    let gear_ratio = match power {
        Some(PowerSource::Engine(_)) => gear_ratio(parts),
        _ => None,
    };
    let top_speed_mph = gear_ratio.and_then(|ratio| top_speed_mph(ratio, STOCK_ENGINE_RPM, parts));

    let tier = match power {
        Some(PowerSource::Engine(_)) => Some(TierProfile::gas(total_hp)),
        Some(PowerSource::Motor(m)) => Some(TierProfile::electric(m.horsepower)),
        None => None,
    };

    let kart_weight = total_weight_lbs + options.base_kart_weight_lbs;
    let power_to_weight = if total_hp > 0.0 && kart_weight > 0.0 {
        Some(round_to(total_hp / (kart_weight / 100.0), 2))
    } else {
        None
    };
    let zero_to_twenty_secs = power_to_weight.map(|ptw| round_to((10.0 - ptw * 0.8).clamp(2.0, 8.0), 1));
    let zero_to_thirty_secs = power_to_weight.map(|ptw| round_to((15.0 - ptw).clamp(3.0, 12.0), 1));

    let total_cost = power.and_then(PowerSource::price).unwrap_or(0.0)
        + parts.iter().filter_map(|p| p.price).sum::<f64>();

    BuildMetrics {
        power_type: power.map(PowerSource::kind),
        total_hp,
        total_torque,
        total_weight_lbs,
        gear_ratio,
        top_speed_mph,
        tier,
        power_to_weight,
        zero_to_twenty_secs,
        zero_to_thirty_secs,
        total_cost: round_to(total_cost, 2),
    }
}

/// Axle sprocket teeth / clutch (or torque converter) teeth, two decimals
pub fn gear_ratio(parts: &[Part]) -> Option<f64> {
    let driver = parts
        .iter()
        .filter(|p| p.category.is_driver())
        .find_map(|p| DRIVER_TEETH_KEYS.iter().find_map(|k| p.spec_number(k)))?;

    let axle = parts
        .iter()
        .filter(|p| p.category == PartCategory::Sprocket)
        .filter(|p| {
            p.spec("position")
                .and_then(|v| v.as_str())
                .map(|pos| matches!(pos.trim().to_lowercase().as_str(), "axle" | "rear"))
                .unwrap_or(false)
        })
        .find_map(|p| p.spec_number("teeth"))?;

    if driver <= 0.0 || axle <= 0.0 {
        return None;
    }
    Some(round_to(axle / driver, 2))
}

/// Road speed for `rpm` through `ratio` on the rear (or only) tire, one decimal.
///
/// `None` without a tire diameter.
pub fn top_speed_mph(ratio: f64, rpm: f64, parts: &[Part]) -> Option<f64> {
    let diameter = [PartCategory::TireRear, PartCategory::Tire]
        .iter()
        .find_map(|cat| {
            parts
                .iter()
                .filter(|p| p.category == *cat)
                .find_map(|p| TIRE_DIAMETER_KEYS.iter().find_map(|k| p.spec_number(k)))
        })?;
    if ratio <= 0.0 || rpm <= 0.0 || diameter <= 0.0 {
        return None;
    }
    let miles_per_rev = std::f64::consts::PI * diameter / INCHES_PER_MILE;
    Some(round_to(rpm / ratio * miles_per_rev * 60.0, 1))
}

fn contribution(part: &Part, key: &str) -> f64 {
    part.spec_number(key).unwrap_or(0.0)
}

fn part_weight(part: &Part) -> f64 {
    part.spec_number("weight_lbs")
        .or_else(|| part.spec_number("weight"))
        .or_else(|| part.spec_number("weight_oz").map(|oz| oz / 16.0))
        .unwrap_or(0.0)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
