use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::{ToggleWishlistRequest, WishlistStatus, WishlistToggleResponse, WishlistView},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_wishlist))
        .route("/toggle", post(toggle))
        .route("/check/{product_id}", get(check))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses((status = 200, description = "Active products in the wishlist", body = ApiResponse<WishlistView>)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn view_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let resp = wishlist_service::view_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/toggle",
    request_body = ToggleWishlistRequest,
    responses(
        (status = 200, description = "Product added or removed", body = WishlistToggleResponse),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn toggle(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ToggleWishlistRequest>,
) -> AppResult<Json<WishlistToggleResponse>> {
    let resp = wishlist_service::toggle_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wishlist/check/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Whether the product is in the wishlist", body = WishlistStatus),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<WishlistStatus>> {
    let resp = wishlist_service::check(&state, &user, product_id).await?;
    Ok(Json(resp))
}
