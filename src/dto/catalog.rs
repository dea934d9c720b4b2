use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entity::products::Gender,
    models::{Category, Product, Review},
};

fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("range").with_message("Must be zero or more.".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub description: String,
    pub category_id: Uuid,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    pub compare_price: Option<Decimal>,
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_new: Option<bool>,
    pub fragrance_notes: String,
    #[validate(range(min = 1, max = 5))]
    pub intensity: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub longevity: Option<i32>,
    pub size: Option<i32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub compare_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_new: Option<bool>,
    pub fragrance_notes: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub intensity: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub longevity: Option<i32>,
    pub size: Option<i32>,
    pub gender: Option<Gender>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryDetail {
    pub category: Category,
    pub products: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Category,
    pub reviews: Vec<Review>,
    pub related_products: Vec<Product>,
    pub user_review: Option<Review>,
}

#[derive(Serialize, ToSchema)]
pub struct HomePage {
    pub featured_products: Vec<Product>,
    pub best_selling_products: Vec<Product>,
    pub categories: Vec<Category>,
    pub recently_viewed: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<Product>,
}
