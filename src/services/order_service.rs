use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, Iterable,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::orders::{
        CheckoutInitial, CheckoutPage, CheckoutRequest, CheckoutResult, OrderList, OrderWithItems,
        ReorderResponse,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{
            self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus,
            PaymentMethod, PaymentStatus,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service,
    state::AppState,
};

pub const ORDERS_PER_PAGE: i64 = 10;

/// Money figures stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn new(
        subtotal: Decimal,
        tax_amount: Decimal,
        shipping_cost: Decimal,
        discount_amount: Decimal,
    ) -> Self {
        Self {
            subtotal,
            tax_amount,
            shipping_cost,
            discount_amount,
            total: subtotal + tax_amount + shipping_cost - discount_amount,
        }
    }

    /// Tax, shipping and discount are not charged yet.
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        Self::new(subtotal, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

/// `ORD-YYYYMMDD-NNNNNNNN`: UTC date plus the leading eight digits of the id's integer value.
pub fn build_order_number(now: DateTime<Utc>, id: Uuid) -> String {
    let digits: String = id.as_u128().to_string().chars().take(8).collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), digits)
}

pub fn confirmation_url(order_id: Uuid) -> String {
    format!("/api/checkout/confirmation/{order_id}")
}

pub(crate) async fn load_with_items<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
) -> AppResult<OrderWithItems> {
    let items: Vec<OrderItem> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let item_count = items.iter().map(|item| i64::from(item.quantity)).sum();
    Ok(OrderWithItems {
        order: Order::from(order),
        items,
        item_count,
    })
}

async fn find_user_order<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<orders::Model> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn checkout_page(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutPage>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = cart_service::get_or_create_cart(&state.orm, user.user_id).await?;
    let lines = cart_service::cart_lines(&state.orm, cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }

    let data = CheckoutPage {
        cart: cart_service::build_view(cart.id, lines),
        initial: CheckoutInitial {
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
        },
        payment_methods: PaymentMethod::iter().collect(),
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Turn the caller's cart into an order.
///
/// The order, its items and the emptying of the cart commit together; any
/// error before the commit drops the transaction and leaves the cart as it was.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResult>> {
    let form = payload.normalized();
    let cart = cart_service::get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;

    let lines = cart_service::cart_lines(&txn, cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }
    form.validate()?;

    let amounts: Vec<(i32, Decimal)> = lines
        .iter()
        .map(|(line, product)| (line.quantity, product.price))
        .collect();
    let (_, subtotal) = cart_service::summarize(&amounts);
    let totals = OrderTotals::from_subtotal(subtotal);

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(build_order_number(now, Uuid::new_v4())),
        user_id: Set(user.user_id),
        email: Set(form.email),
        phone: Set(form.phone),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        address: Set(form.address),
        city: Set(form.city),
        state: Set(form.state.unwrap_or_default()),
        zip_code: Set(form.zip_code),
        country: Set(form.country),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(form.payment_method),
        subtotal: Set(totals.subtotal),
        tax_amount: Set(totals.tax_amount),
        shipping_cost: Set(totals.shipping_cost),
        discount_amount: Set(totals.discount_amount),
        total: Set(totals.total),
        notes: Set(form.notes),
        tracking_number: Set(None),
        shipped_date: Set(None),
        delivered_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(line.quantity),
            price: Set(product.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    let ordered: Vec<Uuid> = lines.iter().map(|(line, _)| line.id).collect();
    cart_service::clear_lines(&txn, cart.id, &ordered).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        user_id = %user.user_id,
        total = %order.total,
        "order placed"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    let message = format!("Order {} has been placed successfully!", order.order_number);
    let data = CheckoutResult {
        confirmation_url: confirmation_url(order.id),
        order: Order::from(order),
        items,
    };
    Ok(ApiResponse::success(message, data, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize_with(ORDERS_PER_PAGE);
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
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
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_user_order(&state.orm, user, id).await?;
    let data = load_with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Copy every line of a past order back into the cart, merging quantities.
pub async fn reorder(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ReorderResponse> {
    let order = find_user_order(&state.orm, user, id).await?;

    let txn = state.orm.begin().await?;
    let cart = cart_service::get_or_create_cart(&txn, user.user_id).await?;
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    for item in &items {
        cart_service::merge_line(&txn, cart.id, item.product_id, item.quantity).await?;
    }
    let cart_count = cart_service::item_count(&txn, cart.id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "reorder",
        "cart_items",
        serde_json::json!({ "order_id": order.id, "lines": items.len() }),
    )
    .await;

    Ok(ReorderResponse {
        success: true,
        message: format!("Items from order {} added to cart", order.order_number),
        cart_count: Some(cart_count),
    })
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_user_order(&state.orm, user, id).await?;
    if !order.can_be_cancelled() {
        return Err(AppError::BadRequest(
            "This order can no longer be cancelled".to_string(),
        ));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::{OrderTotals, build_order_number};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn order_number_uses_date_and_leading_digits() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let id = Uuid::from_u128(123_456_789_012_345_678_901_234_567_890);
        assert_eq!(build_order_number(now, id), "ORD-20250309-12345678");
    }

    #[test]
    fn order_number_has_fixed_shape() {
        let number = build_order_number(Utc::now(), Uuid::new_v4());
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn totals_add_tax_and_shipping_and_subtract_discount() {
        let totals = OrderTotals::new(dec!(25.00), dec!(2.00), dec!(5.99), dec!(1.00));
        assert_eq!(totals.total, dec!(31.99));
        assert_eq!(OrderTotals::from_subtotal(dec!(25.00)).total, dec!(25.00));
    }
}
