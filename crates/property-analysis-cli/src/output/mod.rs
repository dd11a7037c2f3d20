pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted keys (`snapshot.metrics.cap_rate_percent`).
///
/// Arrays are left as leaves so row-shaped data can be rendered separately.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    if let Value::Object(map) = value {
        flatten_into(&mut rows, "", map);
    }
    rows
}

fn flatten_into(rows: &mut Vec<(String, Value)>, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(rows, &path, inner),
            other => rows.push((path, other.clone())),
        }
    }
}

/// Arrays of objects inside the result, keyed by their dotted path.
pub fn nested_tables(value: &Value) -> Vec<(String, Vec<Value>)> {
    flatten(value)
        .into_iter()
        .filter_map(|(key, val)| match val {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                Some((key, items))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_dotted_keys() {
        let value = json!({
            "snapshot": {"metrics": {"cap_rate_percent": "6"}},
            "recalculated": true
        });
        let rows = flatten(&value);
        assert!(rows.contains(&("snapshot.metrics.cap_rate_percent".into(), json!("6"))));
        assert!(rows.contains(&("recalculated".into(), json!(true))));
    }

    #[test]
    fn test_nested_tables_only_object_arrays() {
        let value = json!({
            "supplemental": {"expense_breakdown": [{"name": "Tax", "monthly_amount": "833"}]},
            "warnings": ["x"]
        });
        let tables = nested_tables(&value);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, "supplemental.expense_breakdown");
    }
}
