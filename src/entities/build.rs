//! Build - one power source plus the selected parts
//!
//! A [`BuildFile`] is the on-disk selection (ids only). Resolving it against a
//! catalog produces a [`Build`] holding the records themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::engine::Engine;
use crate::entities::motor::Motor;
use crate::entities::part::Part;

/// Gas or electric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSourceType {
    Gas,
    Electric,
}

impl std::fmt::Display for PowerSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerSourceType::Gas => write!(f, "gas"),
            PowerSourceType::Electric => write!(f, "electric"),
        }
    }
}

/// The selected power source
#[derive(Debug, Clone)]
pub enum PowerSource {
    Engine(Engine),
    Motor(Motor),
}

impl PowerSource {
    pub fn kind(&self) -> PowerSourceType {
        match self {
            PowerSource::Engine(_) => PowerSourceType::Gas,
            PowerSource::Motor(_) => PowerSourceType::Electric,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PowerSource::Engine(e) => &e.id,
            PowerSource::Motor(m) => &m.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PowerSource::Engine(e) => &e.name,
            PowerSource::Motor(m) => &m.name,
        }
    }

    pub fn horsepower(&self) -> f64 {
        match self {
            PowerSource::Engine(e) => e.horsepower,
            PowerSource::Motor(m) => m.horsepower,
        }
    }

    pub fn weight_lbs(&self) -> Option<f64> {
        match self {
            PowerSource::Engine(e) => e.weight_lbs,
            PowerSource::Motor(m) => m.weight_lbs,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            PowerSource::Engine(e) => e.price,
            PowerSource::Motor(m) => m.price,
        }
    }

    pub fn engine(&self) -> Option<&Engine> {
        match self {
            PowerSource::Engine(e) => Some(e),
            PowerSource::Motor(_) => None,
        }
    }

    pub fn motor(&self) -> Option<&Motor> {
        match self {
            PowerSource::Motor(m) => Some(m),
            PowerSource::Engine(_) => None,
        }
    }
}

/// One id or a list of ids for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartRef {
    One(String),
    Many(Vec<String>),
}

impl PartRef {
    pub fn ids(&self) -> Vec<&str> {
        match self {
            PartRef::One(id) => vec![id.as_str()],
            PartRef::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}

/// Build selection as written in a build file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildFile {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor: Option<String>,

    /// Category -> part id(s)
    #[serde(default)]
    pub parts: BTreeMap<String, PartRef>,
}

/// A resolved build: records, not ids
#[derive(Debug, Clone, Default)]
pub struct Build {
    pub name: String,
    pub power: Option<PowerSource>,
    pub parts: Vec<Part>,
}

impl Build {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            power: None,
            parts: Vec::new(),
        }
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.power.as_ref().and_then(PowerSource::engine)
    }
}
