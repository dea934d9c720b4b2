use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Order, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: User,
    pub recent_orders: Vec<Order>,
    pub wishlist_count: i64,
    pub review_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewsletterPreferenceRequest {
    #[serde(default)]
    pub subscribed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterPreferenceResponse {
    pub success: bool,
    pub message: String,
    pub subscribed: bool,
}
