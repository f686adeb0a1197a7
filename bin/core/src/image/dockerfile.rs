use base64::{Engine, engine::general_purpose::STANDARD};

/// Versioned entrypoint asset, shipped inside the generated
/// Dockerfile. Project specific values reach it as env vars at
/// container start, never by interpolation.
const ENTRYPOINT: &str = include_str!("entrypoint.sh");

/// The Dockerfile sent to the platform for a project app. The
/// entrypoint travels base-64 encoded so the build never trips
/// over shell quoting.
pub fn generate_dockerfile(image_ref: &str) -> String {
  let entrypoint = STANDARD.encode(ENTRYPOINT);
  format!(
    "FROM {image_ref}\n\
     \n\
     USER root\n\
     RUN mkdir -p /opt/codeopen \\\n\
     \x20 && echo '{entrypoint}' | base64 -d > /opt/codeopen/entrypoint.sh \\\n\
     \x20 && chmod +x /opt/codeopen/entrypoint.sh\n\
     \n\
     ENTRYPOINT [\"/opt/codeopen/entrypoint.sh\"]\n"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dockerfile_builds_from_the_resolved_image() {
    let dockerfile = generate_dockerfile(
      "ghcr.io/codeopen-sh/codeopen-base:latest",
    );
    assert!(dockerfile.starts_with(
      "FROM ghcr.io/codeopen-sh/codeopen-base:latest\n"
    ));
    assert!(
      dockerfile.ends_with(
        "ENTRYPOINT [\"/opt/codeopen/entrypoint.sh\"]\n"
      )
    );
  }

  #[test]
  fn entrypoint_ships_encoded_not_inlined() {
    let dockerfile = generate_dockerfile("img:latest");
    assert!(
      dockerfile.contains(&STANDARD.encode(ENTRYPOINT))
    );
    // No raw shell from the entrypoint leaks into the dockerfile
    assert!(!dockerfile.contains("git clone"));
  }

  #[test]
  fn only_the_from_line_varies_with_the_image() {
    let a = generate_dockerfile("a:1");
    let b = generate_dockerfile("b:2");
    assert_ne!(a, b);
    assert_eq!(
      a.lines().skip(1).collect::<Vec<_>>(),
      b.lines().skip(1).collect::<Vec<_>>()
    );
  }
}
