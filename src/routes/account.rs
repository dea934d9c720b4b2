use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};

use crate::{
    dto::account::{
        NewsletterPreferenceRequest, NewsletterPreferenceResponse, ProfileResponse,
        UpdateProfileRequest,
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::User,
    response::ApiResponse,
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile).put(update_profile))
        .route("/newsletter", post(newsletter))
        .route("/", delete(delete_account))
}

#[utoipa::path(
    get,
    path = "/api/account/profile",
    responses(
        (status = 200, description = "Profile with recent orders and counters", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let resp = account_service::profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/account/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 400, description = "Email is already taken"),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = account_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/newsletter",
    request_body = NewsletterPreferenceRequest,
    responses((status = 200, description = "Newsletter preference saved", body = NewsletterPreferenceResponse)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn newsletter(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<NewsletterPreferenceRequest>,
) -> AppResult<Json<NewsletterPreferenceResponse>> {
    let resp = account_service::set_newsletter(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/account",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::delete_account(&state, &user).await?;
    Ok(Json(resp))
}
