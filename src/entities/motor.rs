//! Motor record - electric motor catalog entry

use serde::{Deserialize, Serialize};

use crate::core::entity::CatalogRecord;
use crate::entities::engine::{default_active, non_empty};
use crate::entities::spec_value::SpecValue;

/// Electric motor catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Motor {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub brand: String,

    /// Nominal system voltage (12, 24, 36, 48, 72, 96)
    pub voltage: f64,

    /// Continuous power in kW
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_kw: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_power_kw: Option<f64>,

    pub horsepower: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torque_lbft: Option<f64>,

    /// Shaft diameter in inches, for chain-drive motors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaft_diameter: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CatalogRecord for Motor {
    const KIND: &'static str = "motors";

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl Motor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, voltage: f64, horsepower: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            voltage,
            power_kw: None,
            peak_power_kw: None,
            horsepower,
            torque_lbft: None,
            shaft_diameter: None,
            weight_lbs: None,
            price: None,
            is_active: true,
        }
    }

    /// Look up a scalar field by name for rule conditions
    pub fn field(&self, name: &str) -> Option<SpecValue> {
        match name {
            "id" => Some(SpecValue::from(self.id.as_str())),
            "name" => Some(SpecValue::from(self.name.as_str())),
            "brand" => non_empty(&self.brand),
            "voltage" => Some(SpecValue::Number(self.voltage)),
            "power_kw" => self.power_kw.map(SpecValue::Number),
            "peak_power_kw" => self.peak_power_kw.map(SpecValue::Number),
            "horsepower" | "hp" => Some(SpecValue::Number(self.horsepower)),
            "torque_lbft" | "torque" => self.torque_lbft.map(SpecValue::Number),
            "shaft_diameter" => self.shaft_diameter.map(SpecValue::Number),
            "weight_lbs" => self.weight_lbs.map(SpecValue::Number),
            "price" => self.price.map(SpecValue::Number),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_from_yaml() {
        let yaml = "id: m1\nname: 48V 1kW Hub\nvoltage: 48\npower_kw: 1.0\nhorsepower: 1.34\n";
        let motor: Motor = serde_yml::from_str(yaml).unwrap();
        assert_eq!(motor.voltage, 48.0);
        assert_eq!(motor.field("power_kw"), Some(SpecValue::Number(1.0)));
        assert_eq!(motor.field("torque"), None);
        assert_eq!(motor.field("shaft_diameter"), None);
    }
}
