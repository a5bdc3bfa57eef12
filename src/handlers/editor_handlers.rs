//! HTTP handlers for listing, editing and importing metadata entries.
//! Ownership is checked against the store at every step that exposes or
//! changes a record; mapping and rendering are delegated to the services
//! and views.

use crate::{
    errors::AppError,
    handlers::current_user::CurrentUser,
    models::{
        form::{FormSubmission, WAS_ENTITYID},
        record::MetadataRecord,
    },
    services::{
        editor::{self, ValidationError},
        ownership::{partition_by_owner, require_ownership},
    },
    state::AppState,
    views::pages,
};
use axum::{
    Form,
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Query params accepted by the list page.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub delete: Option<String>,
}

/// Query parameter naming the entry to open for editing.
const ENTITYID_PARAM: &str = "entityid";

/// Parameter carrying an externally parsed descriptor to import.
const METADATA_PARAM: &str = "metadata";

/// `GET /`: the user's entries and everyone else's.
///
/// `?delete=<entity id>` removes one of the user's entries first.
pub async fn list_metadata(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let set = state.settings.metadata_set.as_str();

    if let Some(entity_id) = q.delete.as_deref() {
        let existing = state.store.get(entity_id, set).await?.unwrap_or_default();
        require_ownership(&existing, &user_id)?;
        state.store.delete(entity_id, set).await?;
        info!("{} deleted metadata `{}`", user_id, entity_id);
    }

    let records = state.store.list(set).await?;
    let listing = partition_by_owner(records, &user_id);
    Ok(Html(pages::list_page(&user_id, &listing)))
}

/// `GET|POST /edit`: show the editing form, or save a submitted one.
///
/// The form is opened for an existing entry (`entityid`), from an imported
/// descriptor (`metadata`), or as a new entry owned by the caller.
pub async fn edit_metadata(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HashMap<String, String>>,
    Form(mut params): Form<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    // On POST the body and the query string are both request parameters.
    params.extend(query);
    let submission = FormSubmission::from(params);

    if submission.is_submit() {
        save_submission(&state, &user_id, &submission).await?;
        return Ok(Html(pages::saved_page()));
    }

    let record = if let Some(entity_id) = submission.get(ENTITYID_PARAM) {
        let record = state
            .store
            .get(entity_id, &state.settings.metadata_set)
            .await?
            .unwrap_or_default();
        require_ownership(&record, &user_id)?;
        record
    } else if let Some(descriptor) = submission.get(METADATA_PARAM) {
        state.descriptors.parse_sp(descriptor)?
    } else {
        MetadataRecord::owned_by(user_id.as_str())
    };

    let form = editor::meta_to_form(&record);
    Ok(Html(pages::edit_page(&form)))
}

/// `GET /import`: form for pasting a parsed descriptor.
pub async fn import_metadata() -> Html<String> {
    Html(pages::import_page())
}

/// Validate, map and persist a submitted form.
///
/// Every ownership check runs before anything is written, so a refused
/// request leaves the store as it was. Changing the entity id deletes the
/// entry under the old id before saving under the new one. That delete and
/// the save are separate store calls; a failure in between is reported, not
/// retried.
async fn save_submission(
    state: &AppState,
    user_id: &str,
    submission: &FormSubmission,
) -> Result<(), AppError> {
    let set = state.settings.metadata_set.as_str();

    editor::check_form(submission)?;
    let record = editor::form_to_meta(
        submission,
        MetadataRecord::default(),
        MetadataRecord::owned_by(user_id),
    );
    let Some(entity_id) = record.entityid.clone() else {
        return Err(ValidationError::MissingField("entityid").into());
    };

    if let Some(existing) = state.store.get(&entity_id, set).await? {
        require_ownership(&existing, user_id)?;
    }

    let mut renamed_from = None;
    if let Some(previous) = submission
        .get(WAS_ENTITYID)
        .filter(|previous| *previous != entity_id)
    {
        match state.store.get(previous, set).await? {
            Some(old) => {
                require_ownership(&old, user_id)?;
                renamed_from = Some(previous);
            }
            None => debug!("previous entity id `{}` not found, nothing to clean up", previous),
        }
    }

    if let Some(previous) = renamed_from {
        state.store.delete(previous, set).await?;
        info!("{} renamed metadata `{}` to `{}`", user_id, previous, entity_id);
    }

    state
        .store
        .save(&entity_id, set, &record)
        .await
        .map_err(|err| AppError::persistence_failure(&entity_id, err))?;
    info!("{} saved metadata `{}`", user_id, entity_id);
    Ok(())
}
