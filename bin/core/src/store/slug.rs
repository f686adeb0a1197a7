//! Slug derivation. Slugs are url-safe kebab-case identifiers
//! matching `^[a-z0-9][a-z0-9-]{0,62}$`, unique across
//! non-deleted projects.

use std::collections::HashSet;

pub const MAX_SLUG_LENGTH: usize = 63;

/// Lowercases, maps every run of non `[a-z0-9]` characters to a
/// single hyphen, trims hyphens off both ends, and truncates to
/// [MAX_SLUG_LENGTH] deterministically. Returns an empty string
/// for names with no usable characters, callers reject those.
pub fn slugify(name: &str) -> String {
  let lower = name.to_lowercase();
  let mut slug = String::with_capacity(lower.len());
  let mut last_was_hyphen = false;
  for ch in lower.chars() {
    if ch.is_ascii_alphanumeric() {
      slug.push(ch);
      last_was_hyphen = false;
    } else if !last_was_hyphen && !slug.is_empty() {
      slug.push('-');
      last_was_hyphen = true;
    }
  }
  while slug.ends_with('-') {
    slug.pop();
  }
  if slug.len() > MAX_SLUG_LENGTH {
    slug.truncate(MAX_SLUG_LENGTH);
    while slug.ends_with('-') {
      slug.pop();
    }
  }
  slug
}

pub fn valid_slug(slug: &str) -> bool {
  let mut chars = slug.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
    return false;
  }
  slug.len() <= MAX_SLUG_LENGTH
    && chars.all(|c| {
      c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
    })
}

/// `base` untouched if free, else the lowest `-2`, `-3`, ...
/// suffix that frees the namespace. The suffix survives
/// truncation: the base is trimmed so the whole slug stays
/// within [MAX_SLUG_LENGTH].
pub fn next_unique_slug(
  base: &str,
  taken: &HashSet<String>,
) -> String {
  if !taken.contains(base) {
    return base.to_string();
  }
  for n in 2.. {
    let candidate = suffixed_slug(base, n);
    if !taken.contains(&candidate) {
      return candidate;
    }
  }
  unreachable!()
}

/// `{base}-{n}`, trimming the base to respect the length budget.
pub fn suffixed_slug(base: &str, n: u64) -> String {
  let suffix = format!("-{n}");
  let budget = MAX_SLUG_LENGTH - suffix.len();
  let mut base = base.to_string();
  if base.len() > budget {
    base.truncate(budget);
    while base.ends_with('-') {
      base.pop();
    }
  }
  format!("{base}{suffix}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugify_basic() {
    assert_eq!(slugify("Hello World"), "hello-world");
    assert_eq!(slugify("  My  Cool_Project! "), "my-cool-project");
    assert_eq!(slugify("already-a-slug"), "already-a-slug");
    assert_eq!(slugify("42 things"), "42-things");
  }

  #[test]
  fn slugify_empty_and_symbol_only_names() {
    assert_eq!(slugify(""), "");
    assert_eq!(slugify("!!!"), "");
    assert_eq!(slugify("---"), "");
  }

  #[test]
  fn slugify_truncates_deterministically() {
    let name = "x".repeat(100);
    let slug = slugify(&name);
    assert_eq!(slug.len(), MAX_SLUG_LENGTH);
    assert_eq!(slugify(&name), slug);
    assert!(valid_slug(&slug));
  }

  #[test]
  fn slugify_output_always_valid_or_empty() {
    for name in [
      "Hello World",
      "Ünïcödé Náme",
      "a",
      "-leading-hyphen",
      "trailing-hyphen-",
      "UPPER",
    ] {
      let slug = slugify(name);
      assert!(
        slug.is_empty() || valid_slug(&slug),
        "invalid slug {slug:?} from {name:?}"
      );
    }
  }

  #[test]
  fn unique_slug_ladder() {
    let mut taken = HashSet::new();
    assert_eq!(
      next_unique_slug("hello-world", &taken),
      "hello-world"
    );
    taken.insert(String::from("hello-world"));
    assert_eq!(
      next_unique_slug("hello-world", &taken),
      "hello-world-2"
    );
    taken.insert(String::from("hello-world-2"));
    assert_eq!(
      next_unique_slug("hello-world", &taken),
      "hello-world-3"
    );
  }

  #[test]
  fn unique_slug_thousandth_attempt() {
    let mut taken = HashSet::new();
    taken.insert(String::from("busy"));
    for n in 2..=999 {
      taken.insert(format!("busy-{n}"));
    }
    assert_eq!(next_unique_slug("busy", &taken), "busy-1000");
  }

  #[test]
  fn suffix_survives_truncation() {
    let base = "y".repeat(MAX_SLUG_LENGTH);
    let slug = suffixed_slug(&base, 17);
    assert!(slug.len() <= MAX_SLUG_LENGTH);
    assert!(slug.ends_with("-17"));
    assert!(valid_slug(&slug));
  }
}
