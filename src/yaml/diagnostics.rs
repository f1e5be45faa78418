//! Located diagnostics for catalog and build files

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A catalog or build file that is not valid YAML
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error: {message}")]
#[diagnostic(code(kbt::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let offset = err
            .location()
            .map(|loc| loc.index().min(source.len()))
            .unwrap_or(0);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len())),
            help: catalog_hint(&message),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Error reading or parsing a YAML file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot read {}: {source}", .path.display())]
    #[diagnostic(code(kbt::yaml::io))]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Suggest a fix for a YAML or row deserialization error.
///
/// Shared by file-level syntax errors and rejected catalog rows.
pub fn catalog_hint(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("unknown variant") {
        let hint = if msg.contains("torque_converter") {
            "Part categories are snake_case, e.g. torque_converter, tire_rear, motor_controller"
        } else if msg.contains("requires_modification") {
            "compatibility_level is one of direct_fit, requires_modification, adapter_required"
        } else if msg.contains("`warning`") {
            "severity is one of error, warning, info"
        } else if msg.contains("`tapered`") {
            "shaft_type is one of straight, tapered, threaded"
        } else {
            "Use one of the values listed above"
        };
        return Some(hint.to_string());
    }

    if let Some(field) = backticked_after(&msg, "missing field") {
        return Some(format!("Add `{}` to this row", field));
    }

    if msg.contains("invalid type: string") && (msg.contains("f64") || msg.contains("number")) {
        return Some("Numbers must not be quoted: horsepower: 6.5".to_string());
    }

    // An unquoted `#35` is a comment, leaving the value empty
    if msg.contains("invalid type: unit value") {
        return Some("The value is empty. Quote values that start with '#': pitch: \"#35\"".to_string());
    }

    if msg.contains("tab") {
        return Some("Indent with spaces, not tabs".to_string());
    }

    if msg.contains("mapping values are not allowed") || msg.contains("expected block end") {
        return Some("Check the indentation of this row and the space after each ':'".to_string());
    }

    if msg.contains("found unexpected ':'") {
        return Some("Quote values that contain ':'".to_string());
    }

    None
}

fn backticked_after<'a>(msg: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &msg[msg.find(marker)? + marker.len()..];
    let start = rest.find('`')? + 1;
    let end = rest[start..].find('`')?;
    Some(&rest[start..start + end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::part::Part;
    use crate::entities::rule::DirectMapping;

    #[test]
    fn test_span_points_into_source() {
        let source = "- id: e1\n  name: [unclosed\n";
        let err = serde_yml::from_str::<serde_yml::Value>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "engines.yaml");
        assert!(!diag.message().is_empty());
        assert!(diag.offset() <= source.len());
        assert!(diag.offset() > 0);
    }

    #[test]
    fn test_hint_for_unknown_category() {
        let err = serde_yml::from_str::<Part>("id: p1\nname: TC\ncategory: torque converter\n").unwrap_err();
        let hint = catalog_hint(&err.to_string()).unwrap();
        assert!(hint.contains("snake_case"));
    }

    #[test]
    fn test_hint_for_unknown_mapping_level() {
        let err = serde_yml::from_str::<DirectMapping>(
            "engine_id: e1\npart_id: p1\ncompatibility_level: fits\n",
        )
        .unwrap_err();
        let hint = catalog_hint(&err.to_string()).unwrap();
        assert!(hint.contains("adapter_required"));
    }

    #[test]
    fn test_hint_for_missing_field() {
        let err = serde_yml::from_str::<Part>("id: p1\nname: Clutch\n").unwrap_err();
        assert_eq!(catalog_hint(&err.to_string()).as_deref(), Some("Add `category` to this row"));
    }

    #[test]
    fn test_no_hint_for_unrelated_message() {
        assert!(catalog_hint("something else went wrong").is_none());
    }
}
