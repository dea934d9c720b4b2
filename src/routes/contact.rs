use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::contact::{
        ContactRequest, ContactResponse, NewsletterSubscribeRequest, NewsletterSubscribeResponse,
    },
    error::AppResult,
    middleware::json::AppJson,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact))
        .route("/newsletter/subscribe", post(subscribe))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message stored", body = ContactResponse),
        (status = 422, description = "Validation failed"),
    ),
    tag = "Site"
)]
pub async fn contact(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> AppResult<Json<ContactResponse>> {
    let resp = contact_service::submit_contact(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = NewsletterSubscribeRequest,
    responses(
        (status = 200, description = "Subscribed", body = NewsletterSubscribeResponse),
        (status = 422, description = "Validation failed"),
    ),
    tag = "Site"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewsletterSubscribeRequest>,
) -> AppResult<Json<NewsletterSubscribeResponse>> {
    let resp = contact_service::subscribe_newsletter(&state, payload).await?;
    Ok(Json(resp))
}
