use serror::Serror;

/// Flattens a [Serror] into the single line form stored on
/// project `status_detail` and delete warnings:
/// `{error} | 1: {cause} | 2: {cause}`
pub fn format_serror(Serror { error, trace }: &Serror) -> String {
  if trace.is_empty() {
    return error.clone();
  }
  let trace = trace
    .iter()
    .enumerate()
    .map(|(i, msg)| format!("{}: {msg}", i + 1))
    .collect::<Vec<_>>()
    .join(" | ");
  format!("{error} | {trace}")
}

/// `(prefix) rest` labeling for collected warnings.
pub fn format_warning(
  prefix: &str,
  contents: impl std::fmt::Display,
) -> String {
  format!("({prefix}) {contents}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serror_without_trace_is_just_the_error() {
    let serror = Serror {
      error: String::from("failed to create repo"),
      trace: Vec::new(),
    };
    assert_eq!(format_serror(&serror), "failed to create repo");
  }

  #[test]
  fn serror_trace_is_numbered_in_order() {
    let serror = Serror {
      error: String::from("create project failed"),
      trace: vec![
        String::from("failed to create platform app"),
        String::from("connection refused"),
      ],
    };
    assert_eq!(
      format_serror(&serror),
      "create project failed | 1: failed to create platform app | 2: connection refused"
    );
  }
}
