//! Part record - catalog parts with an open-ended specification map

use serde::{Deserialize, Serialize};

use crate::core::entity::CatalogRecord;
use crate::entities::engine::default_active;
use crate::entities::spec_value::{SpecValue, Specifications};

/// Part category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    // Drive train
    Clutch,
    TorqueConverter,
    Chain,
    Sprocket,
    // Chassis
    Axle,
    Wheel,
    Tire,
    TireFront,
    TireRear,
    Brake,
    Throttle,
    Pedals,
    Frame,
    // Engine performance
    Carburetor,
    Exhaust,
    AirFilter,
    Camshaft,
    ValveSpring,
    Flywheel,
    Ignition,
    ConnectingRod,
    Piston,
    Crankshaft,
    OilSystem,
    Header,
    FuelSystem,
    Gasket,
    Hardware,
    Other,
    // Electric drive
    Battery,
    MotorController,
    Bms,
    Charger,
    ThrottleController,
    VoltageConverter,
    BatteryMount,
    WiringHarness,
    FuseKillSwitch,
}

/// Grouping of categories used for cost breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    PowerSource,
    Drivetrain,
    Chassis,
    EngineParts,
    Electrical,
    Other,
}

impl CategoryGroup {
    pub fn label(&self) -> &'static str {
        match self {
            CategoryGroup::PowerSource => "Power Source",
            CategoryGroup::Drivetrain => "Drivetrain",
            CategoryGroup::Chassis => "Chassis",
            CategoryGroup::EngineParts => "Engine Parts",
            CategoryGroup::Electrical => "Electrical",
            CategoryGroup::Other => "Other",
        }
    }
}

impl PartCategory {
    pub const ALL: [PartCategory; 38] = [
        PartCategory::Clutch,
        PartCategory::TorqueConverter,
        PartCategory::Chain,
        PartCategory::Sprocket,
        PartCategory::Axle,
        PartCategory::Wheel,
        PartCategory::Tire,
        PartCategory::TireFront,
        PartCategory::TireRear,
        PartCategory::Brake,
        PartCategory::Throttle,
        PartCategory::Pedals,
        PartCategory::Frame,
        PartCategory::Carburetor,
        PartCategory::Exhaust,
        PartCategory::AirFilter,
        PartCategory::Camshaft,
        PartCategory::ValveSpring,
        PartCategory::Flywheel,
        PartCategory::Ignition,
        PartCategory::ConnectingRod,
        PartCategory::Piston,
        PartCategory::Crankshaft,
        PartCategory::OilSystem,
        PartCategory::Header,
        PartCategory::FuelSystem,
        PartCategory::Gasket,
        PartCategory::Hardware,
        PartCategory::Other,
        PartCategory::Battery,
        PartCategory::MotorController,
        PartCategory::Bms,
        PartCategory::Charger,
        PartCategory::ThrottleController,
        PartCategory::VoltageConverter,
        PartCategory::BatteryMount,
        PartCategory::WiringHarness,
        PartCategory::FuseKillSwitch,
    ];

    /// Snake-case key as stored in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            PartCategory::Clutch => "clutch",
            PartCategory::TorqueConverter => "torque_converter",
            PartCategory::Chain => "chain",
            PartCategory::Sprocket => "sprocket",
            PartCategory::Axle => "axle",
            PartCategory::Wheel => "wheel",
            PartCategory::Tire => "tire",
            PartCategory::TireFront => "tire_front",
            PartCategory::TireRear => "tire_rear",
            PartCategory::Brake => "brake",
            PartCategory::Throttle => "throttle",
            PartCategory::Pedals => "pedals",
            PartCategory::Frame => "frame",
            PartCategory::Carburetor => "carburetor",
            PartCategory::Exhaust => "exhaust",
            PartCategory::AirFilter => "air_filter",
            PartCategory::Camshaft => "camshaft",
            PartCategory::ValveSpring => "valve_spring",
            PartCategory::Flywheel => "flywheel",
            PartCategory::Ignition => "ignition",
            PartCategory::ConnectingRod => "connecting_rod",
            PartCategory::Piston => "piston",
            PartCategory::Crankshaft => "crankshaft",
            PartCategory::OilSystem => "oil_system",
            PartCategory::Header => "header",
            PartCategory::FuelSystem => "fuel_system",
            PartCategory::Gasket => "gasket",
            PartCategory::Hardware => "hardware",
            PartCategory::Other => "other",
            PartCategory::Battery => "battery",
            PartCategory::MotorController => "motor_controller",
            PartCategory::Bms => "bms",
            PartCategory::Charger => "charger",
            PartCategory::ThrottleController => "throttle_controller",
            PartCategory::VoltageConverter => "voltage_converter",
            PartCategory::BatteryMount => "battery_mount",
            PartCategory::WiringHarness => "wiring_harness",
            PartCategory::FuseKillSwitch => "fuse_kill_switch",
        }
    }

    /// Display label ("torque_converter" -> "Torque Converter")
    pub fn label(&self) -> String {
        match self {
            PartCategory::Bms => "BMS".to_string(),
            _ => self
                .as_str()
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    pub fn group(&self) -> CategoryGroup {
        use PartCategory::*;
        match self {
            Clutch | TorqueConverter | Chain | Sprocket => CategoryGroup::Drivetrain,
            Axle | Wheel | Tire | TireFront | TireRear | Brake | Throttle | Pedals | Frame => {
                CategoryGroup::Chassis
            }
            Carburetor | Exhaust | AirFilter | Camshaft | ValveSpring | Flywheel | Ignition
            | ConnectingRod | Piston | Crankshaft | OilSystem | Header | FuelSystem | Gasket => {
                CategoryGroup::EngineParts
            }
            Battery | MotorController | Bms | Charger | ThrottleController | VoltageConverter
            | BatteryMount | WiringHarness | FuseKillSwitch => CategoryGroup::Electrical,
            Hardware | Other => CategoryGroup::Other,
        }
    }

    /// Clutch or torque converter: the driver side of the chain drive
    pub fn is_driver(&self) -> bool {
        matches!(self, PartCategory::Clutch | PartCategory::TorqueConverter)
    }
}

impl std::fmt::Display for PartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PartCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        PartCategory::ALL
            .iter()
            .find(|c| c.as_str() == key)
            .copied()
            .ok_or_else(|| format!("Unknown part category: {}", s))
    }
}

/// Specification keys that older catalog rows store under a different name
const SPEC_ALIASES: &[(&str, &[&str])] = &[
    ("bore_diameter", &["bore_in"]),
    ("bore_in", &["bore_diameter"]),
    ("pitch", &["chain_size"]),
    ("chain_size", &["pitch"]),
];

/// Inch-valued keys that may only be listed in millimetres
const MM_FALLBACKS: &[(&str, &str)] = &[("bore_diameter", "bore_mm"), ("bore_in", "bore_mm")];

const MM_PER_INCH: f64 = 25.4;

/// Part catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: String,

    pub name: String,

    pub category: PartCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Specifications::is_empty")]
    pub specifications: Specifications,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CatalogRecord for Part {
    const KIND: &'static str = "parts";

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

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: PartCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            brand: None,
            price: None,
            specifications: Specifications::new(),
            is_active: true,
        }
    }

    /// Builder-style helper to attach a specification
    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.specifications.insert(key, value);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Specification value with legacy key aliasing
    pub fn spec(&self, key: &str) -> Option<&SpecValue> {
        if let Some(v) = self.specifications.get(key) {
            return Some(v);
        }
        SPEC_ALIASES
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, alts)| alts.iter().find_map(|alt| self.specifications.get(alt)))
    }

    pub fn spec_number(&self, key: &str) -> Option<f64> {
        self.spec(key)
            .and_then(SpecValue::as_f64)
            .or_else(|| self.inches_from_mm(key))
    }

    fn inches_from_mm(&self, key: &str) -> Option<f64> {
        let (_, mm_key) = MM_FALLBACKS.iter().find(|(k, _)| *k == key)?;
        self.specifications.number(mm_key).map(|mm| mm / MM_PER_INCH)
    }

    /// Look up a field for rule conditions.
    ///
    /// `price`, `name`, `brand`, `category` and `id` read the record itself;
    /// `specifications.<key>` or a bare key read the specification map.
    pub fn field(&self, name: &str) -> Option<SpecValue> {
        match name {
            "id" => Some(SpecValue::from(self.id.as_str())),
            "name" => Some(SpecValue::from(self.name.as_str())),
            "category" => Some(SpecValue::from(self.category.as_str())),
            "brand" => self.brand.as_deref().map(SpecValue::from),
            "price" => self.price.map(SpecValue::Number),
            _ => {
                let key = name.strip_prefix("specifications.").unwrap_or(name);
                self.spec(key)
                    .cloned()
                    .or_else(|| self.inches_from_mm(key).map(SpecValue::Number))
            }
        }
    }
}
