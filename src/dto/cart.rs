use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartItemRequest {
    pub item_id: Uuid,
}

/// Reply for the add/update/remove endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartActionResponse {
    pub success: bool,
    pub message: String,
    pub cart_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_total: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub size: i32,
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: CartProduct,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Decimal,
}
