//! Cost estimation
//!
//! Totals are approximate. Prices come straight from catalog rows and
//! placeholders are flat ballpark figures for categories the user has not
//! picked yet; none of it is a pricing guarantee.

use serde::{Deserialize, Serialize};

use crate::entities::build::{PowerSource, PowerSourceType};
use crate::entities::part::{CategoryGroup, Part, PartCategory};
use crate::metrics::performance::round_to;

/// Fraction of the budget at which status turns to "approaching"
pub const APPROACHING_BUDGET_RATIO: f64 = 0.8;

/// Selected parts only, or selected parts plus placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMode {
    #[default]
    Selected,
    FullBuild,
}

/// Placeholder amounts for a gas build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasPlaceholders {
    pub frame: f64,
    pub wheels_tires: f64,
    pub brakes: f64,
    pub hardware: f64,
}

impl Default for GasPlaceholders {
    fn default() -> Self {
        Self {
            frame: 150.0,
            wheels_tires: 100.0,
            brakes: 80.0,
            hardware: 50.0,
        }
    }
}

/// Placeholder amounts for an electric build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricPlaceholders {
    pub battery: f64,
    pub motor_controller: f64,
    pub charger: f64,
    pub bms: f64,
    pub wiring: f64,
}

impl Default for ElectricPlaceholders {
    fn default() -> Self {
        Self {
            battery: 120.0,
            motor_controller: 40.0,
            charger: 25.0,
            bms: 50.0,
            wiring: 30.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPlaceholders {
    pub gas: GasPlaceholders,
    pub electric: ElectricPlaceholders,
}

struct Slot {
    label: &'static str,
    categories: &'static [PartCategory],
    amount: f64,
}

impl CostPlaceholders {
    fn slots(&self, kind: PowerSourceType) -> Vec<Slot> {
        use PartCategory::*;
        match kind {
            PowerSourceType::Gas => vec![
                Slot { label: "Frame", categories: &[Frame], amount: self.gas.frame },
                Slot {
                    label: "Wheels & Tires",
                    categories: &[Wheel, Tire, TireFront, TireRear],
                    amount: self.gas.wheels_tires,
                },
                Slot { label: "Brakes", categories: &[Brake], amount: self.gas.brakes },
                Slot { label: "Hardware", categories: &[Hardware], amount: self.gas.hardware },
            ],
            PowerSourceType::Electric => vec![
                Slot { label: "Battery", categories: &[Battery], amount: self.electric.battery },
                Slot {
                    label: "Motor Controller",
                    categories: &[MotorController],
                    amount: self.electric.motor_controller,
                },
                Slot { label: "Charger", categories: &[Charger], amount: self.electric.charger },
                Slot { label: "BMS", categories: &[Bms], amount: self.electric.bms },
                Slot {
                    label: "Wiring",
                    categories: &[WiringHarness],
                    amount: self.electric.wiring,
                },
            ],
        }
    }
}

/// A placeholder added for a missing category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderLine {
    pub label: String,
    pub group: CategoryGroup,
    pub amount: f64,
}

/// Cost of one category group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShare {
    pub group: CategoryGroup,
    pub label: String,
    pub amount: f64,
    /// Share of the total, 0-100
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub mode: CostMode,
    pub power_cost: f64,
    pub parts_cost: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<PlaceholderLine>,
    pub total: f64,
    /// Per group, most expensive first
    pub breakdown: Vec<CostShare>,
    /// Number of selected items with no price
    pub unpriced: usize,
}

impl CostEstimate {
    pub fn placeholder_total(&self) -> f64 {
        self.placeholders.iter().map(|p| p.amount).sum()
    }

    pub fn budget(&self, budget: f64) -> Option<BudgetStatus> {
        budget_status(self.total, budget)
    }
}

/// Estimate with the default placeholder amounts
pub fn estimate_cost(power: Option<&PowerSource>, parts: &[Part], mode: CostMode) -> CostEstimate {
    estimate_cost_with(power, parts, mode, &CostPlaceholders::default())
}

/// Estimate with caller-supplied placeholder amounts.
///
/// Null prices count as 0. Placeholders are added only in
/// [`CostMode::FullBuild`] and only when a power source is known.
pub fn estimate_cost_with(
    power: Option<&PowerSource>,
    parts: &[Part],
    mode: CostMode,
    placeholders: &CostPlaceholders,
) -> CostEstimate {
    let power_cost = power.and_then(PowerSource::price).unwrap_or(0.0);
    let parts_cost: f64 = parts.iter().filter_map(|p| p.price).sum();
    let unpriced = parts.iter().filter(|p| p.price.is_none()).count()
        + usize::from(power.map_or(false, |p| p.price().is_none()));

    let mut lines = Vec::new();
    if let (CostMode::FullBuild, Some(power)) = (mode, power) {
        for slot in placeholders.slots(power.kind()) {
            let present = parts.iter().any(|p| slot.categories.contains(&p.category));
            if !present && slot.amount > 0.0 {
                lines.push(PlaceholderLine {
                    label: slot.label.to_string(),
                    group: slot.categories[0].group(),
                    amount: slot.amount,
                });
            }
        }
    }

    let total = round_to(
        power_cost + parts_cost + lines.iter().map(|l| l.amount).sum::<f64>(),
        2,
    );

    let mut amounts: Vec<(CategoryGroup, f64)> = Vec::new();
    let mut add = |group: CategoryGroup, amount: f64| {
        if amount <= 0.0 {
            return;
        }
        match amounts.iter_mut().find(|(g, _)| *g == group) {
            Some((_, sum)) => *sum += amount,
            None => amounts.push((group, amount)),
        }
    };
    add(CategoryGroup::PowerSource, power_cost);
    for part in parts {
        add(part.category.group(), part.price.unwrap_or(0.0));
    }
    for line in &lines {
        add(line.group, line.amount);
    }

    let mut breakdown: Vec<CostShare> = amounts
        .into_iter()
        .map(|(group, amount)| CostShare {
            group,
            label: group.label().to_string(),
            amount: round_to(amount, 2),
            percent: if total > 0.0 {
                round_to(amount / total * 100.0, 1)
            } else {
                0.0
            },
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.group.cmp(&b.group))
    });

    CostEstimate {
        mode,
        power_cost: round_to(power_cost, 2),
        parts_cost: round_to(parts_cost, 2),
        placeholders: lines,
        total,
        breakdown,
        unpriced,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetState {
    Under,
    Approaching,
    Over,
}

impl std::fmt::Display for BudgetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetState::Under => write!(f, "under"),
            BudgetState::Approaching => write!(f, "approaching"),
            BudgetState::Over => write!(f, "over"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub state: BudgetState,
    pub budget: f64,
    pub percent_used: f64,
    pub remaining: f64,
    pub overage: f64,
}

/// Compare a total against a budget; `None` for a non-positive budget
pub fn budget_status(total: f64, budget: f64) -> Option<BudgetStatus> {
    if !(budget.is_finite() && budget > 0.0) {
        return None;
    }
    let ratio = total / budget;
    let state = if ratio > 1.0 {
        BudgetState::Over
    } else if ratio >= APPROACHING_BUDGET_RATIO {
        BudgetState::Approaching
    } else {
        BudgetState::Under
    };
    Some(BudgetStatus {
        state,
        budget,
        percent_used: round_to(ratio * 100.0, 1),
        remaining: round_to((budget - total).max(0.0), 2),
        overage: round_to((total - budget).max(0.0), 2),
    })
}
