use serde_json::Value;

/// Print the result document to stdout.
///
/// Pretty-printed for a terminal, one line per document on a pipe.
pub fn print_json(value: &Value) {
    let rendered = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(s) => println!("{}", s),
        Err(e) => tracing::error!("JSON serialization error: {}", e),
    }
}
