use serde_json::Value;

/// Headline figures, most important first.
const PRIORITY_KEYS: [&str; 4] = [
    "monthly_cash_flow",
    "cap_rate_percent",
    "cash_on_cash_return_percent",
    "debt_service_coverage_ratio",
];

/// Print just the headline numbers.
///
/// For an analysis this is the stored metrics' cash flow, cap rate, CoC and
/// DSCR on one line each. For a loan it is the monthly payment. Anything else
/// falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(metrics) = result_obj.pointer("/snapshot/metrics") {
        for key in PRIORITY_KEYS {
            if let Some(val) = metrics.get(key) {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some(payment) = map.get("monthly_payment") {
            println!("{}", format_minimal(payment));
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(rows) = result_obj {
        // Schedules: the final balance
        if let Some(last) = rows.last().and_then(|r| r.get("ending_balance")) {
            println!("{}", format_minimal(last));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
