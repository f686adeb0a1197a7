use serde_json::Value;

/// The platform's logs endpoint has been observed returning
/// three shapes: a bare string, `{ logs: string | string[] }`,
/// and `{ stdout, stderr }`. Normalize all of them to one
/// newline-joined string.
pub fn normalize_logs(body: Value) -> String {
  match body {
    Value::String(logs) => logs,
    Value::Object(mut map) => {
      if let Some(logs) = map.remove("logs") {
        return match logs {
          Value::String(logs) => logs,
          Value::Array(lines) => lines
            .into_iter()
            .filter_map(|line| match line {
              Value::String(line) => Some(line),
              _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
          _ => String::new(),
        };
      }
      let stdout = map
        .remove("stdout")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
      let stderr = map
        .remove("stderr")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
      match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout,
        (true, false) => stderr,
        (true, true) => String::new(),
      }
    }
    _ => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn bare_string_passes_through() {
    assert_eq!(
      normalize_logs(json!("line one\nline two")),
      "line one\nline two"
    );
  }

  #[test]
  fn logs_field_string() {
    assert_eq!(
      normalize_logs(json!({ "logs": "hello" })),
      "hello"
    );
  }

  #[test]
  fn logs_field_array_is_newline_joined() {
    assert_eq!(
      normalize_logs(json!({ "logs": ["one", "two", "three"] })),
      "one\ntwo\nthree"
    );
  }

  #[test]
  fn stdout_stderr_are_joined() {
    assert_eq!(
      normalize_logs(
        json!({ "stdout": "out", "stderr": "err" })
      ),
      "out\nerr"
    );
    assert_eq!(
      normalize_logs(json!({ "stdout": "out", "stderr": "" })),
      "out"
    );
    assert_eq!(
      normalize_logs(json!({ "stderr": "err" })),
      "err"
    );
  }

  #[test]
  fn unknown_shapes_become_empty() {
    assert_eq!(normalize_logs(json!(17)), "");
    assert_eq!(normalize_logs(json!({ "other": true })), "");
  }
}
