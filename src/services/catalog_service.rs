use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryDetail, CategoryList, HomePage, ProductDetail, ProductList, SearchResults},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{self, Column as ProdCol, Entity as Products},
        reviews::{Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Category, Product, Review},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSort},
    services::review_service::rating_stats,
    session::SessionId,
    state::AppState,
};

pub const PRODUCTS_PER_PAGE: i64 = 12;
const HOME_SECTION_LIMIT: u64 = 8;
const HOME_CATEGORY_LIMIT: u64 = 4;
const RELATED_LIMIT: u64 = 4;

pub async fn find_active_product<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<products::Model> {
    Products::find_by_id(id)
        .filter(ProdCol::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Attach rating figures to a batch of products, keeping their order.
pub async fn with_ratings<C: ConnectionTrait>(
    conn: &C,
    models: Vec<products::Model>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let stats = rating_stats(conn, &ids).await?;
    Ok(models
        .into_iter()
        .map(|model| {
            let rating = stats.get(&model.id).copied().unwrap_or_default();
            Product::from_entity(model, rating)
        })
        .collect())
}

fn contains_pattern(term: &str) -> String {
    format!("%{}%", term.trim().to_lowercase())
}

/// Case-insensitive match on product name, description or category name.
async fn search_condition<C: ConnectionTrait>(conn: &C, term: &str) -> AppResult<Condition> {
    let pattern = contains_pattern(term);

    let category_ids: Vec<Uuid> = Categories::find()
        .select_only()
        .column(CategoryCol::Id)
        .filter(Expr::expr(Func::lower(Expr::col(CategoryCol::Name))).like(pattern.clone()))
        .into_tuple()
        .all(conn)
        .await?;

    let mut condition = Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(ProdCol::Name))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(ProdCol::Description))).like(pattern));
    if !category_ids.is_empty() {
        condition = condition.add(ProdCol::CategoryId.is_in(category_ids));
    }
    Ok(condition)
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize_with(PRODUCTS_PER_PAGE);

    let mut condition = Condition::all().add(ProdCol::IsActive.eq(true));
    if let Some(category_id) = query.category {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }
    if let Some(term) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        condition = condition.add(search_condition(&state.orm, term).await?);
    }

    let finder = Products::find().filter(condition);
    let sort = query.sort.unwrap_or_default();

    let (items, total) = if sort == ProductSort::Rating {
        let models = finder.order_by_asc(ProdCol::Name).all(&state.orm).await?;
        let total = models.len() as i64;
        let mut products = with_ratings(&state.orm, models).await?;
        products.sort_by(|a, b| b.average_rating.cmp(&a.average_rating));
        let items = products
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        (items, total)
    } else {
        let finder = match sort {
            ProductSort::PriceLow => finder.order_by_asc(ProdCol::Price),
            ProductSort::PriceHigh => finder.order_by_desc(ProdCol::Price),
            ProductSort::Newest => finder.order_by_desc(ProdCol::CreatedAt),
            ProductSort::Name | ProductSort::Rating => finder.order_by_asc(ProdCol::Name),
        };
        let total = finder.clone().count(&state.orm).await? as i64;
        let models = finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&state.orm)
            .await?;
        (with_ratings(&state.orm, models).await?, total)
    };

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", ProductList { items }, Some(meta)))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success("OK", CategoryList { items }, None))
}

pub async fn category_detail(
    state: &AppState,
    slug: &str,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryDetail>> {
    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .filter(CategoryCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let (page, limit, offset) = pagination.normalize_with(PRODUCTS_PER_PAGE);
    let finder = Products::find()
        .filter(ProdCol::CategoryId.eq(category.id))
        .filter(ProdCol::IsActive.eq(true))
        .order_by_asc(ProdCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let data = CategoryDetail {
        category: Category::from(category),
        products: with_ratings(&state.orm, models).await?,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::new(page, limit, total))))
}

/// Product page; also moves the product to the front of the session's recently viewed list.
pub async fn product_detail(
    state: &AppState,
    slug: &str,
    session: &SessionId,
    viewer: Option<&AuthUser>,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    state.sessions.record_view(session, product.id);

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let review_models = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product.id))
        .filter(ReviewCol::IsActive.eq(true))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let user_review = match viewer {
        Some(user) => Reviews::find()
            .filter(ReviewCol::ProductId.eq(product.id))
            .filter(ReviewCol::UserId.eq(user.user_id))
            .one(&state.orm)
            .await?
            .map(Review::from),
        None => None,
    };

    let related = Products::find()
        .filter(ProdCol::CategoryId.eq(product.category_id))
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::Id.ne(product.id))
        .order_by_asc(ProdCol::Name)
        .limit(RELATED_LIMIT)
        .all(&state.orm)
        .await?;

    let mut with_stats = with_ratings(&state.orm, vec![product]).await?;
    let Some(product) = with_stats.pop() else {
        return Err(AppError::NotFound);
    };

    let data = ProductDetail {
        product,
        category: Category::from(category),
        reviews: review_models.into_iter().map(Review::from).collect(),
        related_products: with_ratings(&state.orm, related).await?,
        user_review,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

async fn recently_viewed_products(
    state: &AppState,
    session: &SessionId,
) -> AppResult<Vec<Product>> {
    let ids = state.sessions.recently_viewed(session).ids();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let models = Products::find()
        .filter(ProdCol::Id.is_in(ids.clone()))
        .filter(ProdCol::IsActive.eq(true))
        .all(&state.orm)
        .await?;
    let mut by_id: HashMap<Uuid, products::Model> =
        models.into_iter().map(|m| (m.id, m)).collect();
    let ordered = ids.iter().filter_map(|id| by_id.remove(id)).collect();

    with_ratings(&state.orm, ordered).await
}

pub async fn home(state: &AppState, session: &SessionId) -> AppResult<ApiResponse<HomePage>> {
    let featured = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::IsFeatured.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(HOME_SECTION_LIMIT)
        .all(&state.orm)
        .await?;

    let best_sellers = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::IsBestSeller.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(HOME_SECTION_LIMIT)
        .all(&state.orm)
        .await?;

    let categories = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .limit(HOME_CATEGORY_LIMIT)
        .all(&state.orm)
        .await?;

    let data = HomePage {
        featured_products: with_ratings(&state.orm, featured).await?,
        best_selling_products: with_ratings(&state.orm, best_sellers).await?,
        categories: categories.into_iter().map(Category::from).collect(),
        recently_viewed: recently_viewed_products(state, session).await?,
    };
    Ok(ApiResponse::success("OK", data, None))
}

/// Free-text search; an empty query returns no results rather than everything.
pub async fn search(state: &AppState, term: Option<String>) -> AppResult<ApiResponse<SearchResults>> {
    let query = term.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        let data = SearchResults {
            query,
            items: Vec::new(),
        };
        return Ok(ApiResponse::success("OK", data, None));
    }

    let condition = search_condition(&state.orm, &query).await?;
    let models = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(condition)
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?;

    let data = SearchResults {
        query,
        items: with_ratings(&state.orm, models).await?,
    };
    Ok(ApiResponse::success("OK", data, None))
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_pattern_is_trimmed_and_lowercased() {
        assert_eq!(contains_pattern("  Rose OUD "), "%rose oud%");
    }
}
