use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::cart::CartView,
    entity::orders::PaymentMethod,
    models::{Order, OrderItem},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 50, message = "This field is required."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "This field is required."))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "This field is required."))]
    pub phone: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "This field is required."))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20, message = "This field is required."))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 100, message = "This field is required."))]
    pub country: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Trim every text field; blank optional fields become `None`.
    pub fn normalized(self) -> Self {
        fn clean(value: String) -> String {
            value.trim().to_string()
        }
        fn clean_opt(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            first_name: clean(self.first_name),
            last_name: clean(self.last_name),
            email: clean(self.email),
            phone: clean(self.phone),
            address: clean(self.address),
            city: clean(self.city),
            state: clean_opt(self.state),
            zip_code: clean(self.zip_code),
            country: clean(self.country),
            payment_method: self.payment_method,
            notes: clean_opt(self.notes),
        }
    }
}

/// Initial values for the checkout form.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutInitial {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPage {
    pub cart: CartView,
    pub initial: CheckoutInitial,
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub confirmation_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub item_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_count: Option<i64>,
}
