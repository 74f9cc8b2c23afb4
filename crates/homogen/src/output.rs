//! Console and JSON output for the `homogen` CLI.

use std::io::{self, Write};

use serde_json::{Value, json};

use homogen_coefs::{display_precision, with_precision};
use homogen_core::CoefValue;

use crate::app::CaseOutcome;

/// Print a JSON value to stdout, pretty-printed.
pub fn output_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", s)?;
    Ok(())
}

/// A value as JSON: numbers for scalars, nested arrays otherwise.
pub fn value_json(value: &CoefValue) -> Value {
    fn nested(shape: &[usize], data: &[f64]) -> Value {
        match shape {
            [] | [_] => json!(data),
            [n, rest @ ..] => {
                let stride = if *n == 0 { 0 } else { data.len() / n };
                Value::Array(
                    (0..*n)
                        .map(|i| nested(rest, &data[i * stride..(i + 1) * stride]))
                        .collect(),
                )
            }
        }
    }
    match value {
        CoefValue::Scalar(v) => json!(v),
        CoefValue::Array { shape, data } => nested(shape, data),
    }
}

fn entry_json(value: &CoefValue) -> Value {
    json!({
        "kind": value.kind(),
        "shape": value.shape(),
        "value": value_json(value),
    })
}

/// JSON view of one case.
pub fn outcome_json(outcome: &CaseOutcome) -> Value {
    let coefs = &outcome.coefs;
    let mut view = json!({
        "volume": coefs.volume(),
        "coefs": coefs
            .iter()
            .map(|(name, value)| (name.clone(), entry_json(value)))
            .collect::<serde_json::Map<_, _>>(),
        "output_dir": outcome.output_dir(),
        "files": outcome.files,
    });
    if let Some(label) = &outcome.label {
        view["label"] = json!(label);
    }
    if let Some(tex) = coefs.tex_names() {
        view["tex_names"] = json!(tex);
    }
    if !outcome.unmatched_tex_names.is_empty() {
        view["unmatched_tex_names"] = json!(outcome.unmatched_tex_names);
    }
    if let Some(store) = &outcome.dependencies {
        view["dependencies"] = Value::Object(
            store
                .iter()
                .map(|(name, value)| (name.clone(), entry_json(value)))
                .collect(),
        );
    }
    view
}

/// JSON document for a whole run: one object for the base case, an array
/// for a parametric study.
pub fn outcomes_json(outcomes: &[CaseOutcome]) -> Value {
    match outcomes {
        [single] if single.label.is_none() => outcome_json(single),
        _ => Value::Array(outcomes.iter().map(outcome_json).collect()),
    }
}

/// Human-readable report of one case at its configured precision.
pub fn render_report(outcome: &CaseOutcome) -> String {
    with_precision(outcome.print_digits, || {
        let mut out = String::new();
        if let Some(label) = &outcome.label {
            out.push_str(&format!("== {} ==\n", label));
        }
        if let Some(store) = &outcome.dependencies {
            let digits = display_precision();
            out.push_str("requirements:\n");
            for (name, value) in store.iter() {
                if outcome.coefs.get(name).is_none() {
                    out.push_str(&format!("{}:\n{:.*}\n", name, digits, value));
                }
            }
            out.push_str("coefficients:\n");
        }
        out.push_str(&outcome.coefs.to_string());
        out
    })
}

pub fn print_report(outcome: &CaseOutcome) {
    print!("{}", render_report(outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::SavedFiles;
    use homogen_coefs::Coefficients;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn outcome(label: Option<&str>) -> CaseOutcome {
        let mut values = IndexMap::new();
        values.insert("A".to_string(), CoefValue::scalar(2.0));
        values.insert(
            "D".to_string(),
            CoefValue::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
        );
        let mut coefs = Coefficients::new(values);
        coefs.set_volume(1.0);
        CaseOutcome {
            label: label.map(String::from),
            print_digits: 2,
            coefs,
            dependencies: None,
            files: SavedFiles::default(),
            unmatched_tex_names: Vec::new(),
        }
    }

    #[test]
    fn matrices_become_nested_arrays() {
        let m = CoefValue::tensor(vec![2, 1, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(value_json(&m), json!([[[1.0, 2.0]], [[3.0, 4.0]]]));
        assert_eq!(value_json(&CoefValue::scalar(0.5)), json!(0.5));
    }

    #[test]
    fn outcome_view() {
        let view = outcome_json(&outcome(None));
        assert_eq!(view["volume"], json!(1.0));
        assert_eq!(view["coefs"]["A"]["kind"], json!("scalar"));
        assert_eq!(view["coefs"]["D"]["shape"], json!([2, 2]));
        assert!(view.get("label").is_none());
    }

    #[test]
    fn study_is_an_array() {
        let view = outcomes_json(&[outcome(Some("a")), outcome(Some("b"))]);
        assert_eq!(view[1]["label"], json!("b"));
    }

    #[test]
    fn report_uses_print_digits() {
        let report = render_report(&outcome(Some("soft")));
        assert!(report.starts_with("== soft ==\nvolume: 1.00\nA:\n2.00\n"), "{report}");
        assert_eq!(display_precision(), homogen_coefs::print::DEFAULT_DISPLAY_PRECISION);
    }
}
