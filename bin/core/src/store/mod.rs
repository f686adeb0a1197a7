use std::{collections::HashSet, str::FromStr};

use anyhow::Context;
use codeopen_client::entities::{
  codeopen_timestamp,
  project::{Project, ProjectStatus},
};
use database::mungos::{
  by_id::find_one_by_id,
  find::find_collect,
  mongodb::bson::{Document, doc, oid::ObjectId},
};

use crate::{errors, state::db_client};

pub mod slug;

/// Load by id or slug. Missing project is a 404.
pub async fn get_project(
  project: &str,
) -> serror::Result<Project> {
  let found = if ObjectId::from_str(project).is_ok() {
    find_one_by_id(&db_client().projects, project)
      .await
      .context("failed to query projects by id")?
  } else {
    db_client()
      .projects
      .find_one(doc! { "slug": project })
      .await
      .context("failed to query projects by slug")?
  };
  found.ok_or_else(|| {
    errors::not_found(format!("no project matching '{project}'"))
  })
}

pub async fn list_projects() -> anyhow::Result<Vec<Project>> {
  find_collect(&db_client().projects, doc! {}, None)
    .await
    .context("failed to list projects")
}

pub async fn list_projects_by_status(
  status: ProjectStatus,
) -> anyhow::Result<Vec<Project>> {
  find_collect(
    &db_client().projects,
    doc! { "status": status.to_string() },
    None,
  )
  .await
  .context("failed to list projects by status")
}

/// Inserts the project and returns its assigned id. A slug
/// collision that slipped past [generate_unique_slug] lands on
/// the unique index and surfaces as Conflict.
pub async fn insert_project(
  project: &Project,
) -> serror::Result<String> {
  let res = match db_client().projects.insert_one(project).await
  {
    Ok(res) => res,
    Err(e) => {
      // Unique index violation on `slug`.
      return if e.to_string().contains("E11000") {
        Err(errors::conflict(format!(
          "project slug '{}' already exists",
          project.slug
        )))
      } else {
        Err(
          anyhow::Error::new(e)
            .context("failed to insert project")
            .into(),
        )
      };
    }
  };
  res
    .inserted_id
    .as_object_id()
    .map(|id| id.to_hex())
    .ok_or_else(|| {
      errors::internal_error(
        "database did not return an ObjectId for the new project",
      )
    })
}

pub async fn update_project(
  project_id: &str,
  set: Document,
) -> anyhow::Result<()> {
  let id = ObjectId::from_str(project_id)
    .context("project id is not a valid ObjectId")?;
  let mut set = set;
  set.insert("updated_at", codeopen_timestamp());
  db_client()
    .projects
    .update_one(doc! { "_id": id }, doc! { "$set": set })
    .await
    .context("failed to update project")?;
  Ok(())
}

/// The only mutation path for `status`. Records the transition
/// timestamp, and stores `detail` verbatim on transitions to
/// Error (cleared otherwise).
pub async fn update_status(
  project_id: &str,
  status: ProjectStatus,
  detail: Option<&str>,
) -> anyhow::Result<()> {
  let now = codeopen_timestamp();
  let detail = match (status, detail) {
    (ProjectStatus::Error, Some(detail)) => detail,
    _ => "",
  };
  update_project(
    project_id,
    doc! {
      "status": status.to_string(),
      "status_detail": detail,
      "status_updated_at": now,
    },
  )
  .await
  .context("failed to update project status")
}

pub async fn delete_project(
  project_id: &str,
) -> anyhow::Result<()> {
  let id = ObjectId::from_str(project_id)
    .context("project id is not a valid ObjectId")?;
  db_client()
    .projects
    .delete_one(doc! { "_id": id })
    .await
    .context("failed to delete project")?;
  Ok(())
}

/// Derives a slug from the human name and bumps a numeric
/// suffix past every slug currently in the store. The unique
/// index on `projects.slug` backstops lost races, and repo name
/// collisions on the forge drive further re-suffixing in the
/// create saga.
pub async fn generate_unique_slug(
  name: &str,
) -> serror::Result<String> {
  let base = slug::slugify(name);
  if base.is_empty() {
    return Err(errors::validation_error(format!(
      "name '{name}' contains no slug-usable characters"
    )));
  }
  // Project counts stay modest, the full slug set is cheap to
  // pull compared to an escaped prefix regex query.
  let taken = list_projects()
    .await?
    .into_iter()
    .map(|p| p.slug)
    .collect::<HashSet<_>>();
  Ok(slug::next_unique_slug(&base, &taken))
}
