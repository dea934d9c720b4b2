use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entity::contacts::ContactSubject;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "This field is required."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub subject: ContactSubject,
    #[validate(length(min = 1, message = "This field is required."))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
    pub notified: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewsletterSubscribeRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterSubscribeResponse {
    pub success: bool,
    pub message: String,
}
