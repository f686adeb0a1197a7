//! Image resolution. Pure and deterministic: the catalog is
//! loaded by the caller, nothing in here does I/O, and the same
//! inputs always produce byte-identical output.

use codeopen_client::entities::{
  config::CoreConfig,
  image::{
    ContainerAddon, ContainerFlavor, ImageResolution,
    ProjectConfigValidation, ResourceLimits, ResourceTier,
  },
};

mod dockerfile;

pub use dockerfile::generate_dockerfile;

/// Flavor / addon / tier records, loaded from the store by the
/// caller.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
  pub flavors: Vec<ContainerFlavor>,
  pub addons: Vec<ContainerAddon>,
  pub tiers: Vec<ResourceTier>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveParams<'a> {
  pub flavor: Option<&'a str>,
  pub addons: &'a [String],
  pub tier: Option<&'a str>,
  pub slug: &'a str,
}

/// Outcome of matching the requested flavor / addons / tier
/// against the catalog, before any derived values.
pub struct Selection<'a> {
  pub flavor_id: String,
  /// At most one addon participates in the image.
  pub primary_addon: Option<&'a ContainerAddon>,
  pub tier: Option<&'a ResourceTier>,
  pub warnings: Vec<String>,
}

pub fn select<'a>(
  catalog: &'a ImageCatalog,
  params: &ResolveParams,
) -> Selection<'a> {
  let mut warnings = Vec::new();

  let default_flavor = catalog
    .flavors
    .iter()
    .find(|f| f.is_default)
    .or(catalog.flavors.first());
  let flavor_id = match params.flavor {
    Some(requested) => match catalog
      .flavors
      .iter()
      .find(|f| f.flavor_id == requested)
    {
      Some(flavor) => flavor.flavor_id.clone(),
      None => {
        let fallback = default_flavor
          .map(|f| f.flavor_id.clone())
          .unwrap_or_else(|| String::from("base"));
        warnings.push(format!(
          "unknown flavor '{requested}', falling back to '{fallback}'"
        ));
        fallback
      }
    },
    None => match default_flavor {
      Some(flavor) => flavor.flavor_id.clone(),
      None => {
        warnings.push(String::from(
          "no flavors configured, using 'base'",
        ));
        String::from("base")
      }
    },
  };

  let mut applicable: Vec<&ContainerAddon> = Vec::new();
  for addon_id in params.addons {
    match catalog
      .addons
      .iter()
      .find(|a| a.addon_id == *addon_id)
    {
      None => warnings
        .push(format!("unknown addon '{addon_id}' ignored")),
      Some(addon)
        if !addon.compatible_flavors.contains(&flavor_id) =>
      {
        warnings.push(format!(
          "addon '{}' is not compatible with flavor '{flavor_id}', dropped",
          addon.addon_id
        ))
      }
      Some(addon) => {
        if !applicable
          .iter()
          .any(|a| a.addon_id == addon.addon_id)
        {
          applicable.push(addon);
        }
      }
    }
  }
  applicable
    .sort_by(|a, b| {
      (a.sort_order, &a.addon_id).cmp(&(b.sort_order, &b.addon_id))
    });
  let primary_addon = applicable.first().copied();
  if applicable.len() > 1 {
    let dropped = applicable[1..]
      .iter()
      .map(|a| a.addon_id.as_str())
      .collect::<Vec<_>>()
      .join(", ");
    warnings.push(format!(
      "at most one addon participates in the image, using '{}', dropped: {dropped}",
      applicable[0].addon_id
    ));
  }

  let default_tier = catalog
    .tiers
    .iter()
    .find(|t| t.is_default)
    .or(catalog.tiers.first());
  let tier = match params.tier {
    Some(requested) => {
      match catalog
        .tiers
        .iter()
        .find(|t| t.tier_id == requested)
      {
        Some(tier) => Some(tier),
        None => {
          match default_tier {
            Some(fallback) => warnings.push(format!(
              "unknown resource tier '{requested}', falling back to '{}'",
              fallback.tier_id
            )),
            None => warnings.push(format!(
              "unknown resource tier '{requested}' and no tiers configured, running without limits"
            )),
          }
          default_tier
        }
      }
    }
    None => default_tier,
  };

  Selection {
    flavor_id,
    primary_addon,
    tier,
    warnings,
  }
}

pub fn resolve(
  catalog: &ImageCatalog,
  config: &CoreConfig,
  params: &ResolveParams,
) -> ImageResolution {
  let selection = select(catalog, params);

  let image_ref = image_ref(
    config,
    &selection.flavor_id,
    selection.primary_addon.map(|a| a.addon_id.as_str()),
  );

  let mut exposed_ports =
    vec![config.opencode_port, config.gateway_port];
  if let Some(addon) = selection.primary_addon {
    exposed_ports.extend(&addon.extra_ports);
  }
  exposed_ports.sort_unstable();
  exposed_ports.dedup();

  let resource_limits = selection
    .tier
    .map(|t| ResourceLimits {
      cpu_millis: t.cpu_millis,
      memory_mb: t.memory_mb,
    })
    .unwrap_or_default();

  ImageResolution {
    image_ref,
    exposed_ports,
    resource_limits,
    domains_config: fqdn_plan(
      selection.primary_addon,
      params.slug,
      config,
    ),
    requires_gpu: selection
      .primary_addon
      .map(|a| a.requires_gpu)
      .unwrap_or(false),
    warnings: selection.warnings,
  }
}

/// Input validation for the api edge: same matching as
/// [resolve], but nothing derived and hard errors separated
/// from fallback warnings.
pub fn validate(
  catalog: &ImageCatalog,
  params: &ResolveParams,
) -> ProjectConfigValidation {
  let selection = select(catalog, params);
  let mut errors = Vec::new();
  if let Some(addon) = selection.primary_addon
    && addon.requires_gpu
    && !selection.tier.map(|t| t.gpu).unwrap_or(false)
  {
    errors.push(format!(
      "addon '{}' requires a gpu, but the selected tier does not provide one",
      addon.addon_id
    ));
  }
  ProjectConfigValidation {
    valid: errors.is_empty(),
    errors,
    warnings: selection.warnings,
  }
}

pub fn image_ref(
  config: &CoreConfig,
  flavor_id: &str,
  primary_addon_id: Option<&str>,
) -> String {
  match primary_addon_id {
    Some(addon) => format!(
      "{}/{}/codeopen-{flavor_id}-{addon}:{}",
      config.image_registry, config.image_owner,
      config.image_version
    ),
    None => format!(
      "{}/{}/codeopen-{flavor_id}:{}",
      config.image_registry, config.image_owner,
      config.image_version
    ),
  }
}

/// The platform domains string: comma separated
/// `https://{fqdn}:{port}` pairs. `opencode-{slug}.{domain}`
/// always, per-addon FQDNs only when the addon is present.
/// Empty when no wildcard domain is configured.
pub fn fqdn_plan(
  primary_addon: Option<&ContainerAddon>,
  slug: &str,
  config: &CoreConfig,
) -> String {
  if config.wildcard_domain.is_empty() {
    return String::new();
  }
  let domain = &config.wildcard_domain;
  let mut domains = vec![format!(
    "https://opencode-{slug}.{domain}:{}",
    config.opencode_port
  )];
  if let Some(addon) = primary_addon
    && !addon.fqdn_prefix.is_empty()
    && let Some(port) = addon.extra_ports.first()
  {
    domains.push(format!(
      "https://{}-{slug}.{domain}:{port}",
      addon.fqdn_prefix
    ));
  }
  domains.join(",")
}

/// The FQDN url the assistant api is reachable at, used by the
/// proxy's last-resort resolution.
pub fn primary_fqdn(
  slug: &str,
  config: &CoreConfig,
) -> Option<String> {
  if config.wildcard_domain.is_empty() {
    return None;
  }
  Some(format!(
    "https://opencode-{slug}.{}",
    config.wildcard_domain
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn catalog() -> ImageCatalog {
    ImageCatalog {
      flavors: vec![
        ContainerFlavor {
          flavor_id: String::from("base"),
          is_default: true,
          ..Default::default()
        },
        ContainerFlavor {
          flavor_id: String::from("heavy"),
          ..Default::default()
        },
      ],
      addons: vec![
        ContainerAddon {
          addon_id: String::from("vnc"),
          compatible_flavors: vec![String::from("base")],
          extra_ports: vec![5901],
          fqdn_prefix: String::from("vnc"),
          sort_order: 2,
          ..Default::default()
        },
        ContainerAddon {
          addon_id: String::from("code"),
          compatible_flavors: vec![
            String::from("base"),
            String::from("heavy"),
          ],
          extra_ports: vec![8443],
          fqdn_prefix: String::from("code"),
          sort_order: 1,
          ..Default::default()
        },
        ContainerAddon {
          addon_id: String::from("cuda"),
          compatible_flavors: vec![String::from("heavy")],
          requires_gpu: true,
          sort_order: 3,
          ..Default::default()
        },
      ],
      tiers: vec![
        ResourceTier {
          tier_id: String::from("standard"),
          cpu_millis: 2000,
          memory_mb: 4096,
          is_default: true,
          ..Default::default()
        },
        ResourceTier {
          tier_id: String::from("gpu-large"),
          cpu_millis: 8000,
          memory_mb: 32768,
          gpu: true,
          ..Default::default()
        },
      ],
    }
  }

  fn config() -> CoreConfig {
    CoreConfig {
      wildcard_domain: String::from("apps.example.com"),
      ..Default::default()
    }
  }

  fn params<'a>(
    flavor: Option<&'a str>,
    addons: &'a [String],
    tier: Option<&'a str>,
  ) -> ResolveParams<'a> {
    ResolveParams {
      flavor,
      addons,
      tier,
      slug: "hello-world",
    }
  }

  #[test]
  fn resolve_is_pure() {
    let addons = vec![String::from("code")];
    let p = params(Some("base"), &addons, Some("standard"));
    let a = resolve(&catalog(), &config(), &p);
    let b = resolve(&catalog(), &config(), &p);
    assert_eq!(a, b);
  }

  #[test]
  fn defaults_resolve_to_flavor_only_image() {
    let res = resolve(&catalog(), &config(), &params(None, &[], None));
    assert_eq!(
      res.image_ref,
      "ghcr.io/codeopen-sh/codeopen-base:latest"
    );
    assert_eq!(res.exposed_ports, [4096, 4097]);
    assert_eq!(res.resource_limits.cpu_millis, 2000);
    assert!(!res.requires_gpu);
    assert!(res.warnings.is_empty());
  }

  #[test]
  fn exposed_ports_sorted_deduped_contain_base_port() {
    let addons = vec![String::from("code")];
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("base"), &addons, None),
    );
    assert_eq!(res.exposed_ports, [4096, 4097, 8443]);
    let mut sorted = res.exposed_ports.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(res.exposed_ports, sorted);
    assert!(res.exposed_ports.contains(&4096));
  }

  #[test]
  fn unknown_flavor_falls_back_with_warning() {
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("nope"), &[], None),
    );
    assert!(res.image_ref.contains("codeopen-base:"));
    assert!(res.warnings[0].contains("unknown flavor 'nope'"));
  }

  #[test]
  fn unknown_addon_resolves_flavor_only_with_warning() {
    let addons = vec![String::from("nonexistent")];
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("base"), &addons, None),
    );
    assert_eq!(
      res.image_ref,
      "ghcr.io/codeopen-sh/codeopen-base:latest"
    );
    assert!(
      res.warnings[0].contains("unknown addon 'nonexistent'")
    );
  }

  #[test]
  fn incompatible_addon_is_dropped() {
    let addons = vec![String::from("vnc")];
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("heavy"), &addons, None),
    );
    assert_eq!(
      res.image_ref,
      "ghcr.io/codeopen-sh/codeopen-heavy:latest"
    );
    assert!(res.warnings[0].contains("not compatible"));
  }

  #[test]
  fn lowest_sort_order_addon_wins_the_tag() {
    let addons =
      vec![String::from("vnc"), String::from("code")];
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("base"), &addons, None),
    );
    assert_eq!(
      res.image_ref,
      "ghcr.io/codeopen-sh/codeopen-base-code:latest"
    );
    assert!(
      res
        .warnings
        .iter()
        .any(|w| w.contains("dropped: vnc"))
    );
  }

  #[test]
  fn unknown_tier_falls_back_with_warning() {
    let res = resolve(
      &catalog(),
      &config(),
      &params(None, &[], Some("mega")),
    );
    assert_eq!(res.resource_limits.cpu_millis, 2000);
    assert!(
      res.warnings[0].contains("unknown resource tier 'mega'")
    );
  }

  #[test]
  fn fqdns_generated_only_with_wildcard_domain() {
    let addons = vec![String::from("code")];
    let res = resolve(
      &catalog(),
      &config(),
      &params(Some("base"), &addons, None),
    );
    assert_eq!(
      res.domains_config,
      "https://opencode-hello-world.apps.example.com:4096,https://code-hello-world.apps.example.com:8443"
    );

    let no_wildcard = CoreConfig::default();
    let res = resolve(
      &catalog(),
      &no_wildcard,
      &params(Some("base"), &addons, None),
    );
    assert_eq!(res.domains_config, "");
  }

  #[test]
  fn gpu_addon_without_gpu_tier_fails_validation() {
    let addons = vec![String::from("cuda")];
    let validation = validate(
      &catalog(),
      &params(Some("heavy"), &addons, Some("standard")),
    );
    assert!(!validation.valid);
    assert!(validation.errors[0].contains("requires a gpu"));

    let validation = validate(
      &catalog(),
      &params(Some("heavy"), &addons, Some("gpu-large")),
    );
    assert!(validation.valid);
  }
}
