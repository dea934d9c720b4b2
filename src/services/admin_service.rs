use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::{
        catalog::{
            CreateCategoryRequest, CreateProductRequest, ProductList, UpdateCategoryRequest,
            UpdateProductRequest,
        },
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        categories::{self, ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus},
        products::{
            self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Gender,
            SIZE_CHOICES, cost_per_ml,
        },
        site_settings::{ActiveModel as SettingsActive, Entity as Settings, SETTINGS_ID},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Order, Product, SiteSettings},
    response::{ApiResponse, Meta},
    routes::{
        admin::{InventoryAdjustRequest, LowStockQuery, UpdateOrderStatusRequest, UpdateSettingsRequest},
        params::{OrderListQuery, SortOrder},
    },
    services::{
        cart_service::is_unique_violation, catalog_service::with_ratings, order_service,
        review_service::product_rating, settings_service,
    },
    slug::{build_sku, slugify},
    state::AppState,
};

const DEFAULT_SIZE: i32 = 100;
const DEFAULT_LEVEL: i32 = 3;
const DEFAULT_LOW_STOCK: i32 = 5;

async fn product_with_rating(state: &AppState, model: products::Model) -> AppResult<Product> {
    let stats = product_rating(&state.orm, model.id).await?;
    Ok(Product::from_entity(model, stats))
}

fn check_size(size: i32) -> AppResult<()> {
    if SIZE_CHOICES.contains(&size) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "size must be one of {:?}",
            SIZE_CHOICES
        )))
    }
}

fn resolve_slug(explicit: Option<&str>, name: &str) -> AppResult<String> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => slugify(given),
        None => slugify(name),
    };
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "a slug cannot be derived from this name".into(),
        ));
    }
    Ok(slug)
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let name = payload.name.trim().to_string();
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;

    let clash = Categories::find()
        .filter(
            Condition::any()
                .add(CategoryCol::Slug.eq(slug.as_str()))
                .add(CategoryCol::Name.eq(name.as_str())),
        )
        .count(&state.orm)
        .await?;
    if clash > 0 {
        return Err(AppError::BadRequest(
            "A category with this name or slug already exists".into(),
        ));
    }

    let now = Utc::now();
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id, "slug": category.slug }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

/// Update a category; the slug stays as it was first derived.
pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let name = payload.name.as_deref().map(str::trim).map(str::to_string);
    if let Some(name) = name.as_deref() {
        let clash = Categories::find()
            .filter(CategoryCol::Name.eq(name))
            .filter(CategoryCol::Id.ne(id))
            .count(&state.orm)
            .await?;
        if clash > 0 {
            return Err(AppError::BadRequest(
                "A category with this name already exists".into(),
            ));
        }
    }

    let mut active: CategoryActive = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::BadRequest("A category with this name already exists".into())
        } else {
            err.into()
        }
    })?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

async fn find_category(state: &AppState, id: Uuid) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown category".into()))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let size = payload.size.unwrap_or(DEFAULT_SIZE);
    check_size(size)?;
    let category = find_category(state, payload.category_id).await?;

    let name = payload.name.trim().to_string();
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;
    let sku = match payload.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => given.to_string(),
        None => build_sku(&category.name, &name, size),
    };

    let clash = Products::find()
        .filter(
            Condition::any()
                .add(ProdCol::Slug.eq(slug.as_str()))
                .add(ProdCol::Sku.eq(sku.as_str())),
        )
        .count(&state.orm)
        .await?;
    if clash > 0 {
        return Err(AppError::BadRequest(
            "A product with this slug or SKU already exists".into(),
        ));
    }

    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        category_id: Set(category.id),
        price: Set(payload.price),
        compare_price: Set(payload.compare_price),
        cost_per_ml: Set(cost_per_ml(payload.price, size)),
        sku: Set(sku),
        stock: Set(payload.stock),
        low_stock_threshold: Set(payload.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        is_best_seller: Set(payload.is_best_seller.unwrap_or(false)),
        is_new: Set(payload.is_new.unwrap_or(false)),
        fragrance_notes: Set(payload.fragrance_notes),
        intensity: Set(payload.intensity.unwrap_or(DEFAULT_LEVEL)),
        longevity: Set(payload.longevity.unwrap_or(DEFAULT_LEVEL)),
        size: Set(size),
        gender: Set(payload.gender.unwrap_or(Gender::Unisex)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "sku": product.sku }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_with_rating(state, product).await?,
        Some(Meta::empty()),
    ))
}

/// Apply a partial update; `cost_per_ml` is recomputed from the resulting price and size.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(size) = payload.size {
        check_size(size)?;
    }
    if let Some(category_id) = payload.category_id {
        find_category(state, category_id).await?;
    }

    let price = payload.price.unwrap_or(existing.price);
    let size = payload.size.unwrap_or(existing.size);

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if payload.compare_price.is_some() {
        active.compare_price = Set(payload.compare_price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(threshold) = payload.low_stock_threshold {
        active.low_stock_threshold = Set(threshold);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_best_seller) = payload.is_best_seller {
        active.is_best_seller = Set(is_best_seller);
    }
    if let Some(is_new) = payload.is_new {
        active.is_new = Set(is_new);
    }
    if let Some(notes) = payload.fragrance_notes {
        active.fragrance_notes = Set(notes);
    }
    if let Some(intensity) = payload.intensity {
        active.intensity = Set(intensity);
    }
    if let Some(longevity) = payload.longevity {
        active.longevity = Set(longevity);
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(gender);
    }
    active.price = Set(price);
    active.size = Set(size);
    active.cost_per_ml = Set(cost_per_ml(price, size));
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated",
        product_with_rating(state, product).await?,
        Some(Meta::empty()),
    ))
}

/// Products are never hard-deleted; they drop out of the storefront instead.
pub async fn deactivate_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProductActive = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_deactivate",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deactivated",
        product_with_rating(state, product).await?,
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find().filter(condition);
    let finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::load_with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Staff may move an order to any status. Shipping and delivery dates are
/// stamped the first time the order reaches those states.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status;
    let now = Utc::now();

    let stamp_shipped = payload.status == OrderStatus::Shipped && existing.shipped_date.is_none();
    let stamp_delivered =
        payload.status == OrderStatus::Delivered && existing.delivered_date.is_none();

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    if let Some(tracking) = payload.tracking_number.filter(|t| !t.trim().is_empty()) {
        active.tracking_number = Set(Some(tracking.trim().to_string()));
    }
    if stamp_shipped {
        active.shipped_date = Set(Some(now.into()));
    }
    if stamp_delivered {
        active.delivered_date = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        from = ?previous,
        to = ?order.status,
        "order status changed"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = match query.threshold {
        Some(threshold) => Products::find().filter(ProdCol::Stock.lte(threshold)),
        None => Products::find()
            .filter(Expr::col(ProdCol::Stock).lte(Expr::col(ProdCol::LowStockThreshold))),
    }
    .filter(ProdCol::IsActive.eq(true))
    .order_by_asc(ProdCol::Stock)
    .order_by_asc(ProdCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let data = ProductList {
        items: with_ratings(&state.orm, models).await?,
    };
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", data, Some(meta)))
}

/// Shift stock by `delta` in a single statement; the row is left alone if
/// the result would go negative.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(payload.delta))
        .col_expr(ProdCol::UpdatedAt, Expr::value(now))
        .filter(ProdCol::Id.eq(id))
        .filter(Expr::expr(Expr::col(ProdCol::Stock).add(payload.delta)).gte(0))
        .exec(&state.orm)
        .await?;

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if result.rows_affected == 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": product.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        product_with_rating(state, product).await?,
        Some(Meta::empty()),
    ))
}

/// Persist new settings, then swap the in-memory snapshot.
pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SiteSettings>> {
    ensure_admin(user)?;
    payload.validate()?;

    let current = match Settings::find_by_id(SETTINGS_ID).one(&state.orm).await? {
        Some(row) => row,
        None => settings_service::load_or_init(&state.orm).await?,
    };

    let mut active: SettingsActive = current.into();
    if let Some(site_name) = payload.site_name {
        active.site_name = Set(site_name);
    }
    if payload.site_description.is_some() {
        active.site_description = Set(payload.site_description);
    }
    if let Some(contact_email) = payload.contact_email {
        active.contact_email = Set(contact_email);
    }
    if payload.phone_number.is_some() {
        active.phone_number = Set(payload.phone_number);
    }
    if payload.address.is_some() {
        active.address = Set(payload.address);
    }
    if payload.facebook_url.is_some() {
        active.facebook_url = Set(payload.facebook_url);
    }
    if payload.instagram_url.is_some() {
        active.instagram_url = Set(payload.instagram_url);
    }
    if payload.twitter_url.is_some() {
        active.twitter_url = Set(payload.twitter_url);
    }
    if payload.tiktok_url.is_some() {
        active.tiktok_url = Set(payload.tiktok_url);
    }
    if let Some(currency) = payload.currency {
        active.currency = Set(currency.to_uppercase());
    }
    if let Some(tax_rate) = payload.tax_rate {
        active.tax_rate = Set(tax_rate);
    }
    if let Some(threshold) = payload.free_shipping_threshold {
        active.free_shipping_threshold = Set(threshold);
    }
    if let Some(cost) = payload.standard_shipping_cost {
        active.standard_shipping_cost = Set(cost);
    }
    if payload.meta_title.is_some() {
        active.meta_title = Set(payload.meta_title);
    }
    if payload.meta_description.is_some() {
        active.meta_description = Set(payload.meta_description);
    }
    active.updated_at = Set(Utc::now().into());
    let saved = active.update(&state.orm).await?;

    let settings = SiteSettings::from(saved);
    state.replace_settings(settings.clone());

    audit::record(
        &state.orm,
        Some(user.user_id),
        "settings_update",
        "site_settings",
        serde_json::json!({ "site_name": settings.site_name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings updated",
        settings,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::{check_size, resolve_slug};

    #[test]
    fn slug_prefers_the_given_value() {
        assert_eq!(resolve_slug(Some("Night Bloom"), "ignored").unwrap(), "night-bloom");
        assert_eq!(resolve_slug(None, "Rose Oud").unwrap(), "rose-oud");
        assert_eq!(resolve_slug(Some("   "), "Amber").unwrap(), "amber");
        assert!(resolve_slug(None, "!!!").is_err());
    }

    #[test]
    fn only_listed_bottle_sizes_are_accepted() {
        assert!(check_size(50).is_ok());
        assert!(check_size(60).is_err());
    }
}
