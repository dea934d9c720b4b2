use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ToggleWishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistToggleResponse {
    pub success: bool,
    pub message: String,
    pub is_in_wishlist: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistStatus {
    pub is_in_wishlist: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistView {
    pub id: Uuid,
    pub items: Vec<Product>,
    pub product_count: i64,
}
