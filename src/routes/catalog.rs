use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{CategoryDetail, CategoryList, HomePage, ProductDetail, ProductList, SearchResults},
        reviews::ReviewRequest,
    },
    error::AppResult,
    middleware::{
        auth::{AuthUser, MaybeAuthUser},
        json::AppJson,
    },
    models::{Review, SiteSettings},
    response::ApiResponse,
    routes::params::{Pagination, ProductQuery, SearchQuery},
    services::{catalog_service, review_service, settings_service},
    session::SessionId,
    state::AppState,
};

// Both product routes share the `{product}` segment name; it carries a slug
// on the detail page and an id on the review endpoint.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/products", get(list_products))
        .route("/products/{product}", get(product_detail))
        .route("/products/{product}/review", post(submit_review))
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(category_detail))
        .route("/search", get(search))
        .route("/settings", get(site_settings))
}

#[utoipa::path(
    get,
    path = "/api/home",
    params(("x-session-id" = Option<String>, Header, description = "Session key for recently viewed products")),
    responses((status = 200, description = "Home page sections", body = ApiResponse<HomePage>)),
    tag = "Catalog"
)]
pub async fn home(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<Json<ApiResponse<HomePage>>> {
    let resp = catalog_service::home(&state, &session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 12"),
        ("category" = Option<Uuid>, Query, description = "Filter by category id"),
        ("q" = Option<String>, Query, description = "Search name, description or category"),
        ("sort" = Option<String>, Query, description = "name, price_low, price_high, newest, rating")
    ),
    responses((status = 200, description = "List active products", body = ApiResponse<ProductList>)),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{product}",
    params(
        ("product" = String, Path, description = "Product slug"),
        ("x-session-id" = Option<String>, Header, description = "Session key for recently viewed products")
    ),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Catalog"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    session: SessionId,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::product_detail(&state, &slug, &session, viewer.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{product}/review",
    params(("product" = Uuid, Path, description = "Product ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review created or updated", body = ApiResponse<Review>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::submit_review(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories", body = ApiResponse<CategoryList>)),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = catalog_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 12")
    ),
    responses(
        (status = 200, description = "Category with its products", body = ApiResponse<CategoryDetail>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Catalog"
)]
pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CategoryDetail>>> {
    let resp = catalog_service::category_detail(&state, &slug, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(("q" = Option<String>, Query, description = "Search term")),
    responses((status = 200, description = "Matching products", body = ApiResponse<SearchResults>)),
    tag = "Catalog"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchResults>>> {
    let resp = catalog_service::search(&state, query.q).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses((status = 200, description = "Current site settings", body = ApiResponse<SiteSettings>)),
    tag = "Catalog"
)]
pub async fn site_settings(State(state): State<AppState>) -> Json<ApiResponse<SiteSettings>> {
    Json(settings_service::current(&state))
}
