use std::collections::HashMap;

use anyhow::Context;
use codeopen_client::{
  api::write::CreateProject,
  entities::{
    codeopen_timestamp,
    config::CoreConfig,
    image::{ContainerAddon, ImageResolution},
    optional_string,
    project::{Project, ProjectStatus},
  },
};
use database::mungos::{find::find_collect, mongodb::bson::doc};
use forge_client::{
  CreateRepoBody, ForgeClient, ForgeError, ForgeRepo,
  MirrorRepoBody,
};
use platform_client::{
  CreateAppFromDockerfile, HealthCheck, PlatformClient,
  PlatformError, UpdateApp,
};

use crate::{
  config::core_config,
  errors,
  image::{self, ImageCatalog, ResolveParams},
  orchestrator::{
    Compensations,
    environment::{self, EnvInputs},
    retry::with_retry,
    run_compensations,
  },
  state::{db_client, forge_client, platform_client},
  store::{self, slug},
  vault,
};

/// How many repo names are tried on the forge before giving up
/// with Conflict.
const MAX_SLUG_ATTEMPTS: u64 = 5;

/// The create saga. Remote effects are compensated in reverse
/// on any step failure, so a failed create leaves neither a
/// forge repo, a platform app, nor a local record behind. The
/// local record is only written after every remote step
/// succeeded, which keeps partial projects invisible to other
/// callers.
#[instrument(name = "CreateProject", skip(req), fields(project_name = req.name))]
pub async fn create_project(
  req: CreateProject,
) -> serror::Result<Project> {
  let config = core_config();
  let name = req.name.trim();
  if name.is_empty() {
    return Err(errors::validation_error(
      "project name must not be empty",
    ));
  }

  let slug = store::generate_unique_slug(name).await?;
  let catalog = load_catalog().await?;
  let params = ResolveParams {
    flavor: req.flavor.as_deref(),
    addons: &req.addons,
    tier: req.tier.as_deref(),
    slug: &slug,
  };

  // Input validation happens before any remote system is
  // touched.
  let validation = image::validate(&catalog, &params);
  if !validation.valid {
    return Err(errors::validation_error(
      validation.errors.join(" | "),
    ));
  }
  let resolution = image::resolve(&catalog, config, &params);
  for warning in &resolution.warnings {
    warn!("create project '{slug}': {warning}");
  }

  let provider_id = match &req.llm_provider {
    Some(id) => Some(id.clone()),
    None => vault::default_provider_id().await?,
  };
  let credential_env =
    vault::get_env_vars(provider_id.as_deref()).await?;

  let selection = image::select(&catalog, &params);
  let (remote, mut compensations) = provision(
    ProvisionArgs {
      config,
      name,
      slug: &slug,
      description: &req.description,
      github_url: req.github_url.as_deref(),
      resolution: &resolution,
      primary_addon: selection.primary_addon,
      credential_env: &credential_env,
    },
    forge_client(),
    platform_client(),
  )
  .await?;

  let now = codeopen_timestamp();
  let project = Project {
    id: String::new(),
    name: name.to_string(),
    slug: remote.slug.clone(),
    description: req.description.clone(),
    forge_repo_id: remote.repo.id,
    forge_owner: remote.repo_owner.clone(),
    platform_app_uuid: remote.app_uuid.clone(),
    container_port: remote.container_port,
    status: ProjectStatus::Provisioning,
    status_detail: String::new(),
    fqdn_url: None,
    llm_provider_id: provider_id.unwrap_or_default(),
    llm_model_id: req.llm_model.unwrap_or_default(),
    clone_url_public: remote.clone_url_public.clone(),
    image_ref: resolution.image_ref.clone(),
    created_at: now,
    updated_at: now,
    status_updated_at: now,
  };

  let project_id = match store::insert_project(&project).await {
    Ok(id) => id,
    Err(e) => {
      run_compensations(compensations).await;
      return Err(e);
    }
  };
  {
    let project_id = project_id.clone();
    compensations.push("delete project record", async move {
      store::delete_project(&project_id).await
    });
  }

  if let Err(e) =
    store::update_status(&project_id, ProjectStatus::Stopped, None)
      .await
  {
    run_compensations(compensations).await;
    return Err(e.into());
  }

  info!(
    "created project '{}' ({project_id}) | repo {} | app {}",
    remote.slug, remote.repo.id, remote.app_uuid
  );
  store::get_project(&project_id).await
}

pub(crate) async fn load_catalog() -> anyhow::Result<ImageCatalog>
{
  let (flavors, addons, tiers) = tokio::try_join!(
    find_collect(&db_client().container_flavors, doc! {}, None),
    find_collect(&db_client().container_addons, doc! {}, None),
    find_collect(&db_client().resource_tiers, doc! {}, None),
  )
  .context("failed to load image catalog")?;
  Ok(ImageCatalog {
    flavors,
    addons,
    tiers,
  })
}

pub(crate) struct ProvisionArgs<'a> {
  pub config: &'a CoreConfig,
  pub name: &'a str,
  pub slug: &'a str,
  pub description: &'a str,
  pub github_url: Option<&'a str>,
  pub resolution: &'a ImageResolution,
  pub primary_addon: Option<&'a ContainerAddon>,
  pub credential_env: &'a HashMap<String, String>,
}

/// What the remote steps produced. The slug may differ from the
/// requested one after collision re-suffixing on the forge.
#[derive(Debug)]
pub(crate) struct RemoteEffects {
  pub slug: String,
  pub repo: ForgeRepo,
  pub repo_owner: String,
  pub app_uuid: String,
  pub container_port: u16,
  pub clone_url_public: String,
}

/// Drives every remote step of the create saga. On failure the
/// compensators of the successful steps have already run (to
/// completion, shielded from caller cancellation); on success
/// they are returned for the caller to arm around persistence.
pub(crate) async fn provision(
  args: ProvisionArgs<'_>,
  forge: &ForgeClient,
  platform: &PlatformClient,
) -> serror::Result<(RemoteEffects, Compensations)> {
  let mut compensations = Compensations::default();
  match provision_inner(&args, forge, platform, &mut compensations)
    .await
  {
    Ok(remote) => Ok((remote, compensations)),
    Err(e) => {
      run_compensations(compensations).await;
      Err(e)
    }
  }
}

async fn provision_inner(
  args: &ProvisionArgs<'_>,
  forge: &ForgeClient,
  platform: &PlatformClient,
  compensations: &mut Compensations,
) -> serror::Result<RemoteEffects> {
  let config = args.config;

  let (slug, repo) =
    create_forge_repo(args, forge, compensations).await?;
  let repo_owner = if repo.owner.login.is_empty() {
    config.forge_owner.clone()
  } else {
    repo.owner.login.clone()
  };

  let container_port = derive_container_port(
    repo.id,
    config.port_range_start,
    config.port_range_end,
  );

  // The FQDN plan uses the slug that actually stuck on the
  // forge.
  let domains = optional_string(image::fqdn_plan(
    args.primary_addon,
    &slug,
    config,
  ));
  let ports_exposes = args
    .resolution
    .exposed_ports
    .iter()
    .map(u16::to_string)
    .collect::<Vec<_>>()
    .join(",");
  let health_check = HealthCheck {
    enabled: true,
    path: config.health_check_path.clone(),
    port: config.opencode_port,
  };

  let app = platform
    .create_app_from_dockerfile(
      &config.platform_project_uuid,
      &config.platform_server_uuid,
      &config.platform_environment_name,
      CreateAppFromDockerfile {
        name: format!("opencode-{slug}"),
        description: args.description.to_string(),
        dockerfile: image::generate_dockerfile(
          &args.resolution.image_ref,
        ),
        ports_exposes: ports_exposes.clone(),
        domains: domains.clone(),
        instant_deploy: false,
        health_check: health_check.clone(),
      },
    )
    .await
    .map_err(errors::platform_error)?;
  let app_uuid = app.uuid;
  {
    let platform = platform.clone();
    let app_uuid = app_uuid.clone();
    compensations.push("delete platform app", async move {
      match platform.delete_app(&app_uuid).await {
        Ok(()) | Err(PlatformError::NotFound { .. }) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)),
      }
    });
  }

  // The create endpoint does not reliably accept ports /
  // domains / health check, re-assert them with a patch.
  with_retry("re-assert app settings", || {
    platform.update_app(
      &app_uuid,
      UpdateApp {
        ports_exposes: Some(ports_exposes.clone()),
        domains: domains.clone(),
        health_check_enabled: Some(health_check.enabled),
        health_check_path: Some(health_check.path.clone()),
        health_check_port: Some(health_check.port),
        ..Default::default()
      },
    )
  })
  .await
  .map_err(errors::platform_error)?;

  let clone_url_public = environment::public_clone_url(
    &repo.clone_url,
    &config.forge_public_address,
  );
  let env = environment::compose_env(
    config,
    EnvInputs {
      project_name: args.name,
      clone_url_public: &clone_url_public,
      credential_env: args.credential_env,
    },
  );
  with_retry("set env vars", || {
    platform.bulk_set_env_vars(&app_uuid, &env)
  })
  .await
  .map_err(errors::platform_error)?;

  Ok(RemoteEffects {
    slug,
    repo,
    repo_owner,
    app_uuid,
    container_port,
    clone_url_public,
  })
}

/// Creates (or mirrors) the forge repo. Name collisions bump a
/// numeric suffix, up to [MAX_SLUG_ATTEMPTS] names total.
async fn create_forge_repo(
  args: &ProvisionArgs<'_>,
  forge: &ForgeClient,
  compensations: &mut Compensations,
) -> serror::Result<(String, ForgeRepo)> {
  let base = args.slug;
  let mut slug = base.to_string();
  let mut attempt: u64 = 1;

  let repo = loop {
    let result = match args.github_url {
      Some(github_url) => {
        forge
          .mirror_repo(&MirrorRepoBody {
            clone_addr: github_url.to_string(),
            repo_name: slug.clone(),
            description: args.description.to_string(),
            private: false,
            mirror: false,
          })
          .await
      }
      None => {
        forge
          .create_repo(&CreateRepoBody {
            name: slug.clone(),
            description: args.description.to_string(),
            private: false,
            auto_init: true,
            default_branch: String::from("main"),
          })
          .await
      }
    };
    match result {
      Ok(repo) => break repo,
      Err(ForgeError::Conflict { .. })
        if attempt < MAX_SLUG_ATTEMPTS =>
      {
        attempt += 1;
        slug = slug::suffixed_slug(base, attempt);
        debug!(
          "repo name taken on the forge, trying '{slug}' ({attempt}/{MAX_SLUG_ATTEMPTS})"
        );
      }
      Err(e) => return Err(errors::forge_error(e)),
    }
  };

  {
    let forge = forge.clone();
    let owner = args.config.forge_owner.clone();
    let name = repo.name.clone();
    compensations.push("delete forge repo", async move {
      match forge.delete_repo(&owner, &name).await {
        // Already gone is success for a compensator.
        Ok(()) | Err(ForgeError::NotFound { .. }) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)),
      }
    });
  }

  Ok((slug, repo))
}

/// Stable port for the project's lifetime, derived from the
/// repo id within the configured range.
pub fn derive_container_port(
  repo_id: i64,
  range_start: u16,
  range_end: u16,
) -> u16 {
  let span = (range_end - range_start) as i64 + 1;
  range_start + repo_id.rem_euclid(span) as u16
}
