use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{
        AddToCartRequest, CartActionResponse, CartCount, CartLine, CartProduct, CartView,
        RemoveCartItemRequest, UpdateCartItemRequest,
    },
    entity::{
        cart_items::{self, ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{self, ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::catalog_service::find_active_product,
    state::AppState,
};

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub async fn get_or_create_cart<C>(conn: &C, user_id: Uuid) -> AppResult<carts::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart);
    }

    let now = Utc::now();
    let inner = conn.begin().await?;
    let created = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&inner)
    .await;

    match created {
        Ok(cart) => {
            inner.commit().await?;
            Ok(cart)
        }
        Err(err) if is_unique_violation(&err) => {
            inner.rollback().await?;
            Carts::find()
                .filter(CartCol::UserId.eq(user_id))
                .one(conn)
                .await?
                .ok_or(AppError::NotFound)
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<cart_items::Model>> {
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(conn)
        .await?)
}

/// Most units a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

fn check_line_quantity(current: i32, added: i32) -> AppResult<()> {
    if i64::from(current) + i64::from(added) > i64::from(MAX_LINE_QUANTITY) {
        return Err(AppError::BadRequest(format!(
            "a cart line holds at most {MAX_LINE_QUANTITY} units"
        )));
    }
    Ok(())
}

async fn bump_quantity<C: ConnectionTrait>(
    conn: &C,
    line: &cart_items::Model,
    quantity: i32,
) -> AppResult<cart_items::Model> {
    check_line_quantity(line.quantity, quantity)?;

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    CartItems::update_many()
        .col_expr(CartItemCol::Quantity, Expr::col(CartItemCol::Quantity).add(quantity))
        .col_expr(CartItemCol::UpdatedAt, Expr::value(now))
        .filter(CartItemCol::Id.eq(line.id))
        .exec(conn)
        .await?;

    CartItems::find_by_id(line.id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Add `quantity` of a product to the cart, merging into an existing line.
pub async fn merge_line<C>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<cart_items::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    match find_line(conn, cart_id, product_id).await? {
        Some(line) => bump_quantity(conn, &line, quantity).await,
        None => insert_line(conn, cart_id, product_id, quantity).await,
    }
}

/// Insert a fresh line for a product not yet in the cart.
///
/// The insert runs in a nested transaction (a savepoint inside an outer one)
/// so a lost race on the `(cart_id, product_id)` unique index can fall back
/// to incrementing the winner's line.
pub async fn insert_line<C>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<cart_items::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    check_line_quantity(0, quantity)?;

    let now = Utc::now();
    let inner = conn.begin().await?;
    let inserted = CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&inner)
    .await;

    match inserted {
        Ok(line) => {
            inner.commit().await?;
            Ok(line)
        }
        Err(err) if is_unique_violation(&err) => {
            inner.rollback().await?;
            let line = find_line(conn, cart_id, product_id)
                .await?
                .ok_or(AppError::NotFound)?;
            bump_quantity(conn, &line, quantity).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete the given lines from a cart; lines added since they were read stay.
pub async fn clear_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    line_ids: &[Uuid],
) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::Id.is_in(line_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn add_item<C>(
    conn: &C,
    cart: &carts::Model,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<cart_items::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let product = find_active_product(conn, product_id).await?;
    merge_line(conn, cart.id, product.id, quantity).await
}

/// `(item_count, subtotal)` for a set of `(quantity, unit_price)` lines.
pub fn summarize(lines: &[(i32, Decimal)]) -> (i64, Decimal) {
    lines
        .iter()
        .fold((0_i64, Decimal::ZERO), |(count, total), (quantity, price)| {
            (
                count + i64::from(*quantity),
                total + *price * Decimal::from(*quantity),
            )
        })
}

pub async fn cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<(cart_items::Model, products::Model)>> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, product)| product.map(|p| (line, p)))
        .collect())
}

pub async fn totals<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<(i64, Decimal)> {
    let lines: Vec<(i32, Decimal)> = cart_lines(conn, cart_id)
        .await?
        .iter()
        .map(|(line, product)| (line.quantity, product.price))
        .collect();
    Ok(summarize(&lines))
}

pub async fn item_count<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<i64> {
    Ok(totals(conn, cart_id).await?.0)
}

pub async fn subtotal<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<Decimal> {
    Ok(totals(conn, cart_id).await?.1)
}

pub fn build_view(cart_id: Uuid, lines: Vec<(cart_items::Model, products::Model)>) -> CartView {
    let amounts: Vec<(i32, Decimal)> = lines
        .iter()
        .map(|(line, product)| (line.quantity, product.price))
        .collect();
    let (item_count, subtotal) = summarize(&amounts);

    let items = lines
        .into_iter()
        .map(|(line, product)| CartLine {
            id: line.id,
            line_total: product.price * Decimal::from(line.quantity),
            quantity: line.quantity,
            product: CartProduct {
                id: product.id,
                name: product.name,
                slug: product.slug,
                price: product.price,
                size: product.size,
                stock: product.stock,
            },
        })
        .collect();

    CartView {
        id: cart_id,
        items,
        item_count,
        subtotal,
    }
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let lines = cart_lines(&state.orm, cart.id).await?;
    Ok(ApiResponse::success(
        "OK",
        build_view(cart.id, lines),
        Some(Meta::empty()),
    ))
}

pub async fn cart_count(state: &AppState, user: &AuthUser) -> AppResult<CartCount> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let count = match cart {
        Some(cart) => item_count(&state.orm, cart.id).await?,
        None => 0,
    };
    Ok(CartCount { count })
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<CartActionResponse> {
    let quantity = payload.quantity.unwrap_or(1);
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let line = add_item(&state.orm, &cart, payload.product_id, quantity).await?;
    let cart_count = item_count(&state.orm, cart.id).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": line.product_id, "quantity": quantity }),
    )
    .await;

    Ok(CartActionResponse {
        success: true,
        message: "Product added to cart".to_string(),
        cart_count,
        cart_total: None,
        item_total: None,
    })
}

/// Load a cart line and make sure it sits in the caller's cart.
async fn owned_line<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<(cart_items::Model, carts::Model)> {
    let line = CartItems::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    let cart = line
        .find_related(Carts)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    if cart.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok((line, cart))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<CartActionResponse> {
    let (line, cart) = owned_line(&state.orm, user, payload.item_id).await?;

    check_line_quantity(0, payload.quantity)?;

    let (message, item_total) = if payload.quantity <= 0 {
        line.delete(&state.orm).await?;
        ("Item removed from cart", Decimal::ZERO)
    } else {
        let product = Products::find_by_id(line.product_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut active: CartItemActive = line.into();
        active.quantity = Set(payload.quantity);
        active.updated_at = Set(Utc::now().into());
        let line = active.update(&state.orm).await?;
        ("Cart updated", product.price * Decimal::from(line.quantity))
    };

    let (cart_count, cart_total) = totals(&state.orm, cart.id).await?;
    Ok(CartActionResponse {
        success: true,
        message: message.to_string(),
        cart_count,
        cart_total: Some(cart_total),
        item_total: Some(item_total),
    })
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveCartItemRequest,
) -> AppResult<CartActionResponse> {
    let (line, cart) = owned_line(&state.orm, user, payload.item_id).await?;
    let product_id = line.product_id;
    line.delete(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let (cart_count, cart_total) = totals(&state.orm, cart.id).await?;
    Ok(CartActionResponse {
        success: true,
        message: "Item removed from cart".to_string(),
        cart_count,
        cart_total: Some(cart_total),
        item_total: None,
    })
}

#[cfg(test)]
mod tests {
    use super::{MAX_LINE_QUANTITY, check_line_quantity, summarize};
    use rust_decimal_macros::dec;

    #[test]
    fn line_quantity_is_capped_without_overflow() {
        assert!(check_line_quantity(0, MAX_LINE_QUANTITY).is_ok());
        assert!(check_line_quantity(MAX_LINE_QUANTITY, 1).is_err());
        assert!(check_line_quantity(i32::MAX, i32::MAX).is_err());
    }

    #[test]
    fn summarize_counts_units_and_prices_lines() {
        let (count, subtotal) = summarize(&[(2, dec!(10.00)), (1, dec!(5.00))]);
        assert_eq!(count, 3);
        assert_eq!(subtotal, dec!(25.00));
    }

    #[test]
    fn empty_cart_summarizes_to_zero() {
        assert_eq!(summarize(&[]), (0, dec!(0)));
    }
}
