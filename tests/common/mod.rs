#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use perfume_storefront::{
    config::AppConfig,
    dto::{auth::RegisterRequest, orders::CheckoutRequest},
    entity::{
        categories::{ActiveModel as CategoryActive, Model as CategoryModel},
        orders::PaymentMethod,
        products::{ActiveModel as ProductActive, Gender, Model as ProductModel},
    },
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    migration::Migrator,
    models::SiteSettings,
    services::{auth_service, settings_service},
    slug::{build_sku, slugify},
    state::AppState,
};

/// Fresh application state over a private in-memory SQLite database.
///
/// A single pooled connection keeps every query on the same in-memory schema.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    Migrator::up(&orm, None).await?;
    let settings = settings_service::load_or_init(&orm).await?;

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret-for-integration-tests".to_string(),
        jwt_ttl_hours: 1,
        contact_email: "staff@example.com".to_string(),
    };
    Ok(AppState::new(orm, config, SiteSettings::from(settings)))
}

/// Register a shopper through the normal sign-up path.
pub async fn register(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let response = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        },
    )
    .await?;
    let user = response.data.expect("registered user");
    Ok(AuthUser {
        user_id: user.id,
        role: ROLE_USER.to_string(),
    })
}

/// Staff identity; admin services only look at the role.
pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_ADMIN.to_string(),
    }
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<CategoryModel> {
    let now = Utc::now();
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(None),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category)
}

pub async fn create_product(
    state: &AppState,
    category: &CategoryModel,
    name: &str,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(format!("{name} eau de parfum")),
        category_id: Set(category.id),
        price: Set(price),
        compare_price: Set(None),
        cost_per_ml: Set(None),
        sku: Set(build_sku(&category.name, name, 50)),
        stock: Set(stock),
        low_stock_threshold: Set(5),
        is_active: Set(true),
        is_featured: Set(false),
        is_best_seller: Set(false),
        is_new: Set(false),
        fragrance_notes: Set("Top: citrus".to_string()),
        intensity: Set(3),
        longevity: Set(3),
        size: Set(50),
        gender: Set(Gender::Unisex),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub fn checkout_form() -> CheckoutRequest {
    CheckoutRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "12 Analytical Row".to_string(),
        city: "London".to_string(),
        state: None,
        zip_code: "N1 9GU".to_string(),
        country: "United Kingdom".to_string(),
        payment_method: PaymentMethod::Cod,
        notes: None,
    }
}
