//! Engine record - gas engine catalog entry

use serde::{Deserialize, Serialize};

use crate::core::entity::CatalogRecord;
use crate::entities::spec_value::SpecValue;

/// Output shaft type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaftType {
    Straight,
    Tapered,
    Threaded,
}

impl Default for ShaftType {
    fn default() -> Self {
        ShaftType::Straight
    }
}

impl std::fmt::Display for ShaftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaftType::Straight => write!(f, "straight"),
            ShaftType::Tapered => write!(f, "tapered"),
            ShaftType::Threaded => write!(f, "threaded"),
        }
    }
}

impl std::str::FromStr for ShaftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" => Ok(ShaftType::Straight),
            "tapered" => Ok(ShaftType::Tapered),
            "threaded" => Ok(ShaftType::Threaded),
            _ => Err(format!(
                "Invalid shaft type: {}. Use straight, tapered, or threaded",
                s
            )),
        }
    }
}

/// Gas engine catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub brand: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement_cc: Option<f64>,

    pub horsepower: f64,

    /// Rated torque (lb-ft)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torque: Option<f64>,

    /// Output shaft diameter in inches
    pub shaft_diameter: f64,

    /// Output shaft length in inches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaft_length: Option<f64>,

    #[serde(default)]
    pub shaft_type: ShaftType,

    #[serde(default)]
    pub mount_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}

impl CatalogRecord for Engine {
    const KIND: &'static str = "engines";

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

impl Engine {
    /// Create a new engine with the fields the evaluator needs
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        horsepower: f64,
        shaft_diameter: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            displacement_cc: None,
            horsepower,
            torque: None,
            shaft_diameter,
            shaft_length: None,
            shaft_type: ShaftType::default(),
            mount_type: String::new(),
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
            "displacement_cc" => self.displacement_cc.map(SpecValue::Number),
            "horsepower" | "hp" => Some(SpecValue::Number(self.horsepower)),
            "torque" => self.torque.map(SpecValue::Number),
            "shaft_diameter" => Some(SpecValue::Number(self.shaft_diameter)),
            "shaft_length" => self.shaft_length.map(SpecValue::Number),
            "shaft_type" => Some(SpecValue::Text(self.shaft_type.to_string())),
            "mount_type" => non_empty(&self.mount_type),
            "weight_lbs" => self.weight_lbs.map(SpecValue::Number),
            "price" => self.price.map(SpecValue::Number),
            _ => None,
        }
    }
}

pub(crate) fn non_empty(s: &str) -> Option<SpecValue> {
    if s.is_empty() {
        None
    } else {
        Some(SpecValue::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_yaml() {
        let yaml = r#"
id: eng-212
name: Predator 212 Hemi
brand: Predator
displacement_cc: 212
horsepower: 6.5
torque: 8.1
shaft_diameter: 0.75
shaft_type: straight
weight_lbs: 37
price: 149.99
"#;
        let engine: Engine = serde_yml::from_str(yaml).unwrap();
        assert_eq!(engine.name, "Predator 212 Hemi");
        assert_eq!(engine.shaft_type, ShaftType::Straight);
        assert!(engine.is_active);
        assert_eq!(engine.price, Some(149.99));
    }

    #[test]
    fn test_field_lookup() {
        let mut engine = Engine::new("e1", "Test", 6.5, 0.75);
        assert_eq!(engine.field("shaft_diameter"), Some(SpecValue::Number(0.75)));
        assert_eq!(engine.field("weight_lbs"), None);
        assert_eq!(engine.field("mount_type"), None);
        assert_eq!(engine.field("torque"), None);
        assert_eq!(engine.field("displacement_cc"), None);
        engine.shaft_type = ShaftType::Tapered;
        assert_eq!(engine.field("shaft_type"), Some(SpecValue::from("tapered")));
        assert_eq!(engine.field("no_such_field"), None);
    }

    #[test]
    fn test_shaft_type_parse() {
        assert_eq!("Tapered".parse::<ShaftType>().unwrap(), ShaftType::Tapered);
        assert!("keyed".parse::<ShaftType>().is_err());
    }
}
