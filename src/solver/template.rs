//! `<name>` placeholder substitution in solver input templates.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::{FlowMcError, Result, SolverError};

/// Outcome of a substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    /// Parameters whose placeholder occurred in the template.
    pub used: Vec<String>,
    /// Placeholders left in the text because no parameter matched.
    pub unused: Vec<String>,
    /// Parameters without a placeholder in the template.
    pub ignored: Vec<String>,
}

/// Replaces every `<name>` in `template` by the value of parameter `name`.
///
/// Parameters without a placeholder are ignored and placeholders without a
/// parameter are left untouched; both are listed in the report.
#[must_use]
pub fn substitute(template: &str, params: &BTreeMap<String, String>) -> (String, SubstitutionReport) {
    let mut text = template.to_owned();
    let mut report = SubstitutionReport::default();
    for (name, value) in params {
        let placeholder = format!("<{name}>");
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, value);
            report.used.push(name.clone());
        } else {
            report.ignored.push(name.clone());
        }
    }
    for name in placeholders(&text) {
        if !report.unused.contains(&name) {
            report.unused.push(name);
        }
    }
    (text, report)
}

/// Renders `template_file` into `output_file`.
///
/// # Errors
///
/// Returns [`SolverError::TemplateMissing`] if the template does not exist,
/// or an I/O error if reading or writing fails.
pub fn substitute_file(
    template_file: &Path,
    output_file: &Path,
    params: &BTreeMap<String, String>,
) -> Result<SubstitutionReport> {
    if !template_file.is_file() {
        return Err(SolverError::TemplateMissing(template_file.to_path_buf()).into());
    }
    let template =
        fs::read_to_string(template_file).map_err(|e| FlowMcError::io(template_file, e))?;
    let (text, report) = substitute(&template, params);
    fs::write(output_file, text).map_err(|e| FlowMcError::io(output_file, e))?;
    Ok(report)
}

/// Names of the `<identifier>` placeholders in `text`, in order of
/// appearance.
fn placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len > 0 && after[len..].starts_with('>') {
            names.push(after[..len].to_owned());
        }
        rest = after;
    }
    names
}

/// Text a parameter value is substituted as.
///
/// Scalars are written bare; sequences and mappings as JSON flow text,
/// which YAML reads back unchanged.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => render_value(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn unmatched_placeholder_is_left_alone() {
        let (text, report) = substitute("a=<x> b=<y>", &params(&[("x", "5")]));
        assert_eq!(text, "a=5 b=<y>");
        assert_eq!(report.used, vec!["x"]);
        assert_eq!(report.unused, vec!["y"]);
        assert!(report.ignored.is_empty());
    }

    #[test]
    fn extra_parameters_are_ignored() {
        let (text, report) = substitute(
            "mesh: <mesh>\nmesh_again: <mesh>\n",
            &params(&[("mesh", "box_healed.msh"), ("k", "1e-9")]),
        );
        assert_eq!(text, "mesh: box_healed.msh\nmesh_again: box_healed.msh\n");
        assert_eq!(report.ignored, vec!["k"]);
    }

    #[test]
    fn comparison_operators_are_not_placeholders() {
        assert_eq!(
            placeholders("if a < b and c > d: <ok> <not ok>"),
            vec!["ok"]
        );
    }

    #[test]
    fn values_render_as_yaml_flow_text() {
        let v: Value = serde_yaml::from_str("[1, 2.5, true]").unwrap();
        assert_eq!(render_value(&v), "[1,2.5,true]");
        assert_eq!(render_value(&Value::from(3)), "3");
        assert_eq!(render_value(&Value::from("abc")), "abc");
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = substitute_file(
            &dir.path().join("flow_tmpl.yaml"),
            &dir.path().join("flow.yaml"),
            &params(&[]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Solver(SolverError::TemplateMissing(_))
        ));
    }

    #[test]
    fn template_file_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let tmpl = dir.path().join("flow_tmpl.yaml");
        let out = dir.path().join("flow.yaml");
        fs::write(&tmpl, "output: <output_dir>\n").unwrap();
        let report = substitute_file(&tmpl, &out, &params(&[("output_dir", "output_flow")])).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "output: output_flow\n");
        assert_eq!(report.used, vec!["output_dir"]);
    }
}
