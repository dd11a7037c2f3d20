use serde_json::Value;
use std::io;

use super::flatten;

/// Write output as CSV to stdout.
///
/// Envelopes and plain objects become two-column `field,value` rows with
/// dotted keys; arrays of objects become one row per element.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => {
            let body = map.get("result").unwrap_or(value);
            write_field_rows(&mut wtr, body)
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => wtr.write_record([&format_csv_value(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!("CSV write error: {}", e);
    }
}

fn write_field_rows(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    value: &Value,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in flatten(value) {
        wtr.write_record([key.as_str(), &format_csv_value(&val)])?;
    }
    Ok(())
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
