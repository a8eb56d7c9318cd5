//! Join team request API handlers

use crate::api::{json_body, path_param, MessageResponse};
use crate::domain::{CreateJoinTeamRequestInput, JoinTeamRequestId, UpdateJoinTeamRequestInput};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::service::join_team_request::{DELETED_MESSAGE, UPDATED_MESSAGE};
use crate::state::HasServices;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

type IdParam = std::result::Result<Path<JoinTeamRequestId>, PathRejection>;

/// GET /api/v1/join_team_requests
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    let requests = state.join_team_request_service().list(&auth).await?;
    Ok(Json(requests))
}

/// POST /api/v1/join_team_requests
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    payload: std::result::Result<Json<CreateJoinTeamRequestInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let request = state.join_team_request_service().create(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/join_team_requests/{id}
pub async fn show<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    id: IdParam,
) -> Result<impl IntoResponse> {
    let id = path_param(id)?;
    let request = state.join_team_request_service().show(&auth, id).await?;
    Ok(Json(request))
}

/// PUT/PATCH /api/v1/join_team_requests/{id}
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    id: IdParam,
    payload: std::result::Result<Json<UpdateJoinTeamRequestInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = path_param(id)?;
    let input = json_body(payload)?;
    state
        .join_team_request_service()
        .update(&auth, id, input)
        .await?;
    Ok(Json(MessageResponse::new(UPDATED_MESSAGE)))
}

/// DELETE /api/v1/join_team_requests/{id}
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    id: IdParam,
) -> Result<impl IntoResponse> {
    let id = path_param(id)?;
    state.join_team_request_service().delete(&auth, id).await?;
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}

/// POST /api/v1/join_team_requests/decline/{id}
pub async fn decline<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    id: IdParam,
) -> Result<impl IntoResponse> {
    let id = path_param(id)?;
    let request = state.join_team_request_service().decline(&auth, id).await?;
    Ok(Json(request))
}

/// POST /api/v1/join_team_requests/accept/{id}
pub async fn accept<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    id: IdParam,
) -> Result<impl IntoResponse> {
    let id = path_param(id)?;
    let request = state.join_team_request_service().accept(&auth, id).await?;
    Ok(Json(request))
}
