use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    categories, order_items,
    orders::{self, OrderStatus, PaymentMethod, PaymentStatus},
    products::{self, Gender},
    reviews, site_settings, users,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub newsletter_subscribed: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            date_of_birth: model.date_of_birth,
            newsletter_subscribed: model.newsletter_subscribed,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Active-review figures for one product, recomputed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingStats {
    pub average: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category_id: Uuid,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub cost_per_ml: Option<Decimal>,
    pub sku: String,
    pub stock: i32,
    pub low_stock_threshold: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_best_seller: bool,
    pub is_new: bool,
    pub fragrance_notes: String,
    pub intensity: i32,
    pub longevity: i32,
    pub size: i32,
    pub gender: Gender,
    pub average_rating: Decimal,
    pub review_count: i64,
    pub discount_percentage: i32,
    pub is_in_stock: bool,
    pub is_low_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model, stats: RatingStats) -> Self {
        Self {
            discount_percentage: model.discount_percentage(),
            is_in_stock: model.is_in_stock(),
            is_low_stock: model.is_low_stock(),
            average_rating: stats.average,
            review_count: stats.count,
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            category_id: model.category_id,
            price: model.price,
            compare_price: model.compare_price,
            cost_per_ml: model.cost_per_ml,
            sku: model.sku,
            stock: model.stock,
            low_stock_threshold: model.low_stock_threshold,
            is_active: model.is_active,
            is_featured: model.is_featured,
            is_best_seller: model.is_best_seller,
            is_new: model.is_new,
            fragrance_notes: model.fragrance_notes,
            intensity: model.intensity,
            longevity: model.longevity,
            size: model.size,
            gender: model.gender,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            rating: model.rating,
            title: model.title,
            comment: model.comment,
            verified_purchase: model.verified_purchase,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub can_be_cancelled: bool,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            can_be_cancelled: model.can_be_cancelled(),
            is_paid: model.is_paid(),
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            email: model.email,
            phone: model.phone,
            first_name: model.first_name,
            last_name: model.last_name,
            address: model.address,
            city: model.city,
            state: model.state,
            zip_code: model.zip_code,
            country: model.country,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            subtotal: model.subtotal,
            tax_amount: model.tax_amount,
            shipping_cost: model.shipping_cost,
            discount_amount: model.discount_amount,
            total: model.total,
            notes: model.notes,
            tracking_number: model.tracking_number,
            shipped_date: model.shipped_date.map(|dt| dt.with_timezone(&Utc)),
            delivered_date: model.delivered_date.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            total_price: model.total_price(),
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: Option<String>,
    pub contact_email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub currency: String,
    pub tax_rate: Decimal,
    pub free_shipping_threshold: Decimal,
    pub standard_shipping_cost: Decimal,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl From<site_settings::Model> for SiteSettings {
    fn from(model: site_settings::Model) -> Self {
        Self {
            site_name: model.site_name,
            site_description: model.site_description,
            contact_email: model.contact_email,
            phone_number: model.phone_number,
            address: model.address,
            facebook_url: model.facebook_url,
            instagram_url: model.instagram_url,
            twitter_url: model.twitter_url,
            tiktok_url: model.tiktok_url,
            currency: model.currency,
            tax_rate: model.tax_rate,
            free_shipping_threshold: model.free_shipping_threshold,
            standard_shipping_cost: model.standard_shipping_cost,
            meta_title: model.meta_title,
            meta_description: model.meta_description,
        }
    }
}
