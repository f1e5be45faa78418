//! Condition matcher - evaluates one rule condition against a (source, target) pair
//!
//! A condition describes a *violation*: when it matches, the rule fires and
//! the rule's message template is rendered with the values that were compared.
//!
//! Supported shapes of the `condition` blob:
//!
//! ```yaml
//! # numeric equality with tolerance (fires when the values differ)
//! { op: mismatch, source_field: shaft_diameter, target_field: bore_in, tolerance: 0.01 }
//! { op: mismatch, field: bore_in, value: 0.75 }
//! # set membership (fires when the value is not listed)
//! { op: not_in, field: chain_size, values: ["#35", "#40"] }
//! # inclusive range (fires when outside [min, max])
//! { op: out_of_range, field: voltage, min: 36, max: 48 }
//! # presence / absence
//! { op: missing, field: bore_in }
//! { op: present, field: requires_adapter }
//! # comparison requirement (fires when the comparison is false)
//! { compare: less_than_or_equal, source_field: power_kw, target_field: max_power_kw }
//! # legacy equality check
//! { source_key: chain_size, target_key: chain_size, comparison: equals }
//! ```
//!
//! Fields are read from the target part unless written as `source_field`.
//! A comparison whose field is absent does not match.

use serde::Deserialize;
use thiserror::Error;

use crate::entities::engine::Engine;
use crate::entities::motor::Motor;
use crate::entities::part::Part;
use crate::entities::rule::Rule;
use crate::entities::spec_value::{format_number, SpecValue};

/// Tolerance used for numeric equality when neither rule nor config sets one
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Absorbs float representation error at the tolerance boundary
const BOUNDARY_EPSILON: f64 = 1e-9;

/// A rule whose condition cannot be evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("rule '{rule_id}': condition must be a mapping")]
    NotAMapping { rule_id: String },

    #[error("rule '{rule_id}': unknown operator '{op}'")]
    UnknownOperator { rule_id: String, op: String },

    #[error("rule '{rule_id}': operator '{op}' requires {expected}")]
    MissingOperand {
        rule_id: String,
        op: String,
        expected: &'static str,
    },

    #[error("rule '{rule_id}': {reason}")]
    InvalidValue { rule_id: String, reason: String },
}

impl RuleError {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleError::NotAMapping { rule_id }
            | RuleError::UnknownOperator { rule_id, .. }
            | RuleError::MissingOperand { rule_id, .. }
            | RuleError::InvalidValue { rule_id, .. } => rule_id,
        }
    }
}

/// An entity a condition can read fields from
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Engine(&'a Engine),
    Motor(&'a Motor),
    Part(&'a Part),
}

impl<'a> Subject<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Subject::Engine(e) => &e.name,
            Subject::Motor(m) => &m.name,
            Subject::Part(p) => &p.name,
        }
    }

    /// Read a field; `engine.`, `motor.` and `part.` prefixes are ignored
    pub fn field(&self, key: &str) -> Option<SpecValue> {
        let key = ["engine.", "motor.", "part."]
            .iter()
            .find_map(|prefix| key.strip_prefix(prefix))
            .unwrap_or(key);
        match self {
            Subject::Engine(e) => e.field(key),
            Subject::Motor(m) => m.field(key),
            Subject::Part(p) => p.field(key),
        }
    }
}

/// Which side of the pair a field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub side: Side,
    pub key: String,
}

impl FieldRef {
    fn source(key: impl Into<String>) -> Self {
        Self {
            side: Side::Source,
            key: key.into(),
        }
    }

    fn target(key: impl Into<String>) -> Self {
        Self {
            side: Side::Target,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldRef),
    Literal(SpecValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" | "equals" | "eq" => Ok(CompareOp::Equal),
            "not_equal" | "not_equals" | "ne" => Ok(CompareOp::NotEqual),
            "greater_than" | "gt" => Ok(CompareOp::GreaterThan),
            "less_than" | "lt" => Ok(CompareOp::LessThan),
            "greater_than_or_equal" | "gte" => Ok(CompareOp::GreaterThanOrEqual),
            "less_than_or_equal" | "lte" => Ok(CompareOp::LessThanOrEqual),
            "contains" => Ok(CompareOp::Contains),
            _ => Err(s.to_string()),
        }
    }
}

/// Parsed condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Fires when the two values are not equal within tolerance
    Mismatch {
        left: FieldRef,
        right: Operand,
        tolerance: Option<f64>,
    },
    /// Fires when the value is not one of `values`
    NotIn { field: FieldRef, values: Vec<SpecValue> },
    /// Fires when the value lies outside `[min, max]`
    OutOfRange {
        field: FieldRef,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Fires when the field is absent
    Missing { field: FieldRef },
    /// Fires when the field is present
    Present { field: FieldRef },
    /// Fires when the comparison does not hold
    Compare {
        op: CompareOp,
        left: FieldRef,
        right: Operand,
        tolerance: Option<f64>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawCondition {
    op: Option<String>,
    compare: Option<String>,
    comparison: Option<String>,
    field: Option<String>,
    source_field: Option<String>,
    target_field: Option<String>,
    source_key: Option<String>,
    target_key: Option<String>,
    value: Option<SpecValue>,
    values: Option<Vec<SpecValue>>,
    min: Option<f64>,
    max: Option<f64>,
    tolerance: Option<f64>,
}

impl Condition {
    /// Parse a rule's condition blob
    pub fn parse(rule: &Rule) -> Result<Self, RuleError> {
        let rule_id = rule.id.clone();
        if !rule.condition.is_object() {
            return Err(RuleError::NotAMapping { rule_id });
        }
        let raw: RawCondition =
            serde_json::from_value(rule.condition.clone()).map_err(|e| RuleError::InvalidValue {
                rule_id: rule_id.clone(),
                reason: e.to_string(),
            })?;

        if let Some(tol) = raw.tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(RuleError::InvalidValue {
                    rule_id,
                    reason: format!("tolerance must be a non-negative number, got {}", tol),
                });
            }
        }

        // Shapes without `op`: admin comparison rules and legacy key rules
        let op = match (&raw.op, &raw.compare, &raw.source_key) {
            (Some(op), _, _) => op.to_lowercase(),
            (None, Some(_), _) => "compare".to_string(),
            (None, None, Some(_)) => "legacy".to_string(),
            (None, None, None) => {
                return Err(RuleError::MissingOperand {
                    rule_id,
                    op: "<none>".to_string(),
                    expected: "an 'op', 'compare' or 'source_key' entry",
                })
            }
        };

        let missing = |expected: &'static str| RuleError::MissingOperand {
            rule_id: rule_id.clone(),
            op: op.clone(),
            expected,
        };

        match op.as_str() {
            "mismatch" => {
                let (left, right) = pair_operands(&raw).ok_or_else(|| {
                    missing("'source_field' and 'target_field', or one field and a 'value'")
                })?;
                Ok(Condition::Mismatch {
                    left,
                    right,
                    tolerance: raw.tolerance,
                })
            }
            "not_in" => {
                let field = single_field(&raw).ok_or_else(|| missing("a 'field'"))?;
                let values = raw.values.clone().ok_or_else(|| missing("a 'values' list"))?;
                if values.is_empty() {
                    return Err(RuleError::InvalidValue {
                        rule_id,
                        reason: "'values' must not be empty".to_string(),
                    });
                }
                Ok(Condition::NotIn { field, values })
            }
            "out_of_range" => {
                let field = single_field(&raw).ok_or_else(|| missing("a 'field'"))?;
                if raw.min.is_none() && raw.max.is_none() {
                    return Err(missing("'min' and/or 'max'"));
                }
                if let (Some(min), Some(max)) = (raw.min, raw.max) {
                    if min > max {
                        return Err(RuleError::InvalidValue {
                            rule_id,
                            reason: format!("min {} is greater than max {}", min, max),
                        });
                    }
                }
                Ok(Condition::OutOfRange {
                    field,
                    min: raw.min,
                    max: raw.max,
                })
            }
            "missing" => {
                let field = single_field(&raw).ok_or_else(|| missing("a 'field'"))?;
                Ok(Condition::Missing { field })
            }
            "present" => {
                let field = single_field(&raw).ok_or_else(|| missing("a 'field'"))?;
                Ok(Condition::Present { field })
            }
            "compare" => {
                let name = raw
                    .compare
                    .as_deref()
                    .ok_or_else(|| missing("a 'compare' operator"))?;
                let cmp = name
                    .to_lowercase()
                    .parse::<CompareOp>()
                    .map_err(|op| RuleError::UnknownOperator {
                        rule_id: rule_id.clone(),
                        op,
                    })?;
                let (left, right) = pair_operands(&raw).ok_or_else(|| {
                    missing("'source_field' and 'target_field', or one field and a 'value'")
                })?;
                Ok(Condition::Compare {
                    op: cmp,
                    left,
                    right,
                    tolerance: raw.tolerance,
                })
            }
            "legacy" => {
                let source = raw.source_key.clone().ok_or_else(|| missing("'source_key'"))?;
                let target = raw.target_key.clone().ok_or_else(|| missing("'target_key'"))?;
                let cmp = match raw.comparison.as_deref() {
                    None | Some("equals") => CompareOp::Equal,
                    Some("not_equals") => CompareOp::NotEqual,
                    Some(other) => {
                        return Err(RuleError::UnknownOperator {
                            rule_id,
                            op: other.to_string(),
                        })
                    }
                };
                Ok(Condition::Compare {
                    op: cmp,
                    left: FieldRef::source(source),
                    right: Operand::Field(FieldRef::target(target)),
                    tolerance: raw.tolerance,
                })
            }
            other => Err(RuleError::UnknownOperator {
                rule_id,
                op: other.to_string(),
            }),
        }
    }
}

/// Two operands: source vs target field, or one field vs a literal
fn pair_operands(raw: &RawCondition) -> Option<(FieldRef, Operand)> {
    match (&raw.source_field, &raw.target_field, &raw.value) {
        (Some(s), Some(t), _) => Some((
            FieldRef::source(s.clone()),
            Operand::Field(FieldRef::target(t.clone())),
        )),
        (_, _, Some(v)) => single_field(raw).map(|f| (f, Operand::Literal(v.clone()))),
        _ => None,
    }
}

/// The one field a single-operand condition reads
fn single_field(raw: &RawCondition) -> Option<FieldRef> {
    if let Some(t) = raw.target_field.as_ref().or(raw.field.as_ref()) {
        return Some(FieldRef::target(t.clone()));
    }
    raw.source_field.as_ref().map(|s| FieldRef::source(s.clone()))
}

/// Tuning for the matcher
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Tolerance for numeric equality when the rule sets none
    pub default_tolerance: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            default_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Outcome of matching one condition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchResult {
    pub matched: bool,
    /// Rendered warning message, present when matched
    pub detail: Option<String>,
}

impl MatchResult {
    fn no_match() -> Self {
        Self::default()
    }
}

/// Match a rule against a pair using default options
pub fn match_condition(
    rule: &Rule,
    source: Subject<'_>,
    target: Subject<'_>,
) -> Result<MatchResult, RuleError> {
    let condition = Condition::parse(rule)?;
    Ok(match_parsed(
        rule,
        &condition,
        source,
        target,
        &MatchOptions::default(),
    ))
}

/// Match an already-parsed condition.
///
/// Pure: the result depends only on the arguments.
pub fn match_parsed(
    rule: &Rule,
    condition: &Condition,
    source: Subject<'_>,
    target: Subject<'_>,
    options: &MatchOptions,
) -> MatchResult {
    let mut bindings = Bindings::new(source, target);

    let fired = match condition {
        Condition::Mismatch {
            left,
            right,
            tolerance,
        } => {
            let tol = tolerance.unwrap_or(options.default_tolerance);
            bindings.set("tolerance", format_number(tol));
            match (bindings.resolve(left), bindings.resolve_operand(right)) {
                (Some(a), Some(b)) => values_equal(&a, &b, tol).map_or(false, |eq| !eq),
                _ => false,
            }
        }
        Condition::NotIn { field, values } => match bindings.resolve(field) {
            Some(v) => {
                bindings.set(
                    "values",
                    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "),
                );
                !values
                    .iter()
                    .any(|allowed| values_equal(&v, allowed, options.default_tolerance) == Some(true))
            }
            None => false,
        },
        Condition::OutOfRange { field, min, max } => {
            if let Some(min) = min {
                bindings.set("min", format_number(*min));
            }
            if let Some(max) = max {
                bindings.set("max", format_number(*max));
            }
            match bindings.resolve(field).and_then(|v| v.as_f64()) {
                Some(n) => min.map_or(false, |m| n < m) || max.map_or(false, |m| n > m),
                None => false,
            }
        }
        Condition::Missing { field } => bindings.resolve(field).is_none(),
        Condition::Present { field } => bindings.resolve(field).is_some(),
        Condition::Compare {
            op,
            left,
            right,
            tolerance,
        } => {
            let tol = tolerance.unwrap_or(options.default_tolerance);
            match (bindings.resolve(left), bindings.resolve_operand(right)) {
                (Some(a), Some(b)) => compare(*op, &a, &b, tol).map_or(false, |holds| !holds),
                _ => false,
            }
        }
    };

    if !fired {
        return MatchResult::no_match();
    }
    MatchResult {
        matched: true,
        detail: Some(bindings.render(&rule.warning_message)),
    }
}

/// Equality with tolerance; `None` when the values are not comparable
pub fn values_equal(a: &SpecValue, b: &SpecValue, tolerance: f64) -> Option<bool> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => {
            let slack = BOUNDARY_EPSILON * x.abs().max(y.abs()).max(1.0);
            Some((x - y).abs() <= tolerance + slack)
        }
        (None, None) => match (a, b) {
            (SpecValue::Bool(x), SpecValue::Bool(y)) => Some(x == y),
            (SpecValue::Text(x), SpecValue::Text(y)) => {
                Some(x.trim().eq_ignore_ascii_case(y.trim()))
            }
            _ => None,
        },
        _ => None,
    }
}

fn compare(op: CompareOp, a: &SpecValue, b: &SpecValue, tolerance: f64) -> Option<bool> {
    match op {
        CompareOp::Equal => values_equal(a, b, tolerance),
        CompareOp::NotEqual => values_equal(a, b, tolerance).map(|eq| !eq),
        CompareOp::Contains => Some(
            a.to_string()
                .to_lowercase()
                .contains(&b.to_string().to_lowercase()),
        ),
        _ => {
            let (x, y) = (a.as_f64()?, b.as_f64()?);
            Some(match op {
                CompareOp::GreaterThan => x > y,
                CompareOp::LessThan => x < y,
                CompareOp::GreaterThanOrEqual => x >= y,
                CompareOp::LessThanOrEqual => x <= y,
                CompareOp::Equal | CompareOp::NotEqual | CompareOp::Contains => unreachable!(),
            })
        }
    }
}

/// Values resolved while matching, available to the message template
struct Bindings<'a> {
    source: Subject<'a>,
    target: Subject<'a>,
    values: Vec<(String, String)>,
}

impl<'a> Bindings<'a> {
    fn new(source: Subject<'a>, target: Subject<'a>) -> Self {
        Self {
            source,
            target,
            values: vec![
                ("source".to_string(), source.name().to_string()),
                ("target".to_string(), target.name().to_string()),
            ],
        }
    }

    fn set(&mut self, key: &str, value: String) {
        if !self.values.iter().any(|(k, _)| k == key) {
            self.values.push((key.to_string(), value));
        }
    }

    fn resolve(&mut self, field: &FieldRef) -> Option<SpecValue> {
        let value = match field.side {
            Side::Source => self.source.field(&field.key),
            Side::Target => self.target.field(&field.key),
        }?;
        let slot = match field.side {
            Side::Source => "source_value",
            Side::Target => "target_value",
        };
        self.set(slot, value.to_string());
        self.set(&field.key, value.to_string());
        Some(value)
    }

    fn resolve_operand(&mut self, operand: &Operand) -> Option<SpecValue> {
        match operand {
            Operand::Field(f) => self.resolve(f),
            Operand::Literal(v) => {
                self.set("value", v.to_string());
                Some(v.clone())
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some((_, v)) = self.values.iter().find(|(k, _)| k == key) {
            return Some(v.clone());
        }
        self.target
            .field(key)
            .or_else(|| self.source.field(key))
            .map(|v| v.to_string())
    }

    /// Substitute `{placeholder}`s; unknown placeholders are kept verbatim
    fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    let is_key = !key.is_empty()
                        && key
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                    match (is_key, is_key.then(|| self.lookup(key)).flatten()) {
                        (true, Some(value)) => out.push_str(&value),
                        _ => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
