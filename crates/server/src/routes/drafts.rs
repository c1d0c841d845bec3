use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use worklog_core::draft::{storage_key, DraftScope, ReportDraft};

use crate::{
    error::{AppError, Result},
    middleware::user::CurrentUser,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/:scope", get(get_draft).put(save_draft).delete(delete_draft))
}

async fn get_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(scope): Path<String>,
) -> Result<Json<ReportDraft>> {
    let scope = DraftScope::parse(&scope)?;
    let key = storage_key(&user.id, &scope);

    let payload = sqlx::query_scalar::<_, String>(
        "SELECT payload FROM report_drafts WHERE storage_key = ? AND user_id = ?",
    )
    .bind(&key)
    .bind(&user.id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No draft for {scope}")))?;

    let draft = ReportDraft::from_json(&payload)
        .map_err(|e| AppError::Internal(format!("Stored draft {key} is unreadable: {e}")))?;

    Ok(Json(draft))
}

async fn save_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(scope): Path<String>,
    Json(draft): Json<ReportDraft>,
) -> Result<Json<ReportDraft>> {
    let scope = DraftScope::parse(&scope)?;
    if draft.scope != scope {
        return Err(AppError::Validation(format!(
            "Draft is for {}, not {scope}",
            draft.scope
        )));
    }

    let key = storage_key(&user.id, &scope);
    let payload = draft.to_json()?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO report_drafts (storage_key, user_id, payload, updated_at) VALUES (?, ?, ?, ?)
        ON CONFLICT(storage_key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
        "#,
    )
    .bind(&key)
    .bind(&user.id)
    .bind(&payload)
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(draft))
}

async fn delete_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(scope): Path<String>,
) -> Result<Json<()>> {
    let scope = DraftScope::parse(&scope)?;

    // Discarding a draft that was never stored is not an error
    sqlx::query("DELETE FROM report_drafts WHERE storage_key = ? AND user_id = ?")
        .bind(storage_key(&user.id, &scope))
        .bind(&user.id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(()))
}
