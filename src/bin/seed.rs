use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use perfume_storefront::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{self, ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Gender, cost_per_ml},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::{auth_service::hash_password, cart_service, settings_service, wishlist_service},
    slug::{build_sku, slugify},
};

struct SeedProduct {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    notes: &'static str,
    price_cents: i64,
    compare_cents: Option<i64>,
    size: i32,
    stock: i32,
    gender: Gender,
    featured: bool,
    best_seller: bool,
}

const CATEGORIES: [(&str, &str); 4] = [
    ("Floral", "Rose, jasmine and white-flower compositions"),
    ("Woody", "Cedar, sandalwood and vetiver bases"),
    ("Oriental", "Amber, vanilla and spice"),
    ("Fresh", "Citrus, aquatic and green accords"),
];

const PRODUCTS: [SeedProduct; 6] = [
    SeedProduct {
        name: "Midnight Rose",
        category: "Floral",
        description: "A dark rose softened with plum and musk.",
        notes: "Top: plum. Heart: Turkish rose. Base: musk, patchouli.",
        price_cents: 8900,
        compare_cents: Some(11000),
        size: 50,
        stock: 40,
        gender: Gender::Women,
        featured: true,
        best_seller: true,
    },
    SeedProduct {
        name: "Jasmine Veil",
        category: "Floral",
        description: "Sheer jasmine over a warm skin musk.",
        notes: "Top: bergamot. Heart: jasmine sambac. Base: white musk.",
        price_cents: 7200,
        compare_cents: None,
        size: 75,
        stock: 3,
        gender: Gender::Women,
        featured: false,
        best_seller: false,
    },
    SeedProduct {
        name: "Cedar Trail",
        category: "Woody",
        description: "Dry cedar and smoked vetiver.",
        notes: "Top: pink pepper. Heart: cedar. Base: vetiver, leather.",
        price_cents: 9500,
        compare_cents: None,
        size: 100,
        stock: 25,
        gender: Gender::Men,
        featured: true,
        best_seller: false,
    },
    SeedProduct {
        name: "Oud Al Layl",
        category: "Oriental",
        description: "Resinous oud with saffron and amber.",
        notes: "Top: saffron. Heart: oud. Base: amber, labdanum.",
        price_cents: 18500,
        compare_cents: Some(21000),
        size: 100,
        stock: 12,
        gender: Gender::Unisex,
        featured: true,
        best_seller: true,
    },
    SeedProduct {
        name: "Vanilla Ember",
        category: "Oriental",
        description: "Smoky vanilla with tonka and clove.",
        notes: "Top: clove. Heart: tonka. Base: Madagascar vanilla.",
        price_cents: 6400,
        compare_cents: None,
        size: 30,
        stock: 60,
        gender: Gender::Unisex,
        featured: false,
        best_seller: true,
    },
    SeedProduct {
        name: "Sea Glass",
        category: "Fresh",
        description: "Salted citrus and driftwood.",
        notes: "Top: grapefruit. Heart: sea salt. Base: driftwood.",
        price_cents: 5800,
        compare_cents: None,
        size: 125,
        stock: 0,
        gender: Gender::Unisex,
        featured: false,
        best_seller: false,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,perfume_storefront=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    settings_service::load_or_init(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin12345", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user12345", ROLE_USER).await?;
    seed_catalog(&orm).await?;

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let user_id = match Users::find().filter(UserCol::Email.eq(email)).one(orm).await? {
        Some(existing) => {
            let mut active: UserActive = existing.into();
            active.role = Set(role.to_string());
            active.update(orm).await?.id
        }
        None => {
            let now = Utc::now();
            UserActive {
                id: Set(Uuid::new_v4()),
                email: Set(email.to_string()),
                password_hash: Set(hash_password(password)?),
                first_name: Set(role.to_string()),
                last_name: Set("Account".to_string()),
                phone: Set(String::new()),
                date_of_birth: Set(None),
                newsletter_subscribed: Set(false),
                role: Set(role.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(orm)
            .await?
            .id
        }
    };

    cart_service::get_or_create_cart(orm, user_id).await?;
    wishlist_service::get_or_create_wishlist(orm, user_id).await?;
    tracing::info!(%email, %role, "ensured user");
    Ok(user_id)
}

async fn ensure_category(
    orm: &DatabaseConnection,
    name: &str,
    description: &str,
) -> anyhow::Result<categories::Model> {
    let slug = slugify(name);
    if let Some(existing) = Categories::find()
        .filter(CategoryCol::Slug.eq(slug.as_str()))
        .one(orm)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug),
        description: Set(Some(description.to_string())),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;
    Ok(category)
}

async fn seed_catalog(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        categories.push(ensure_category(orm, name, description).await?);
    }

    let mut created = 0;
    for seed in &PRODUCTS {
        let slug = slugify(seed.name);
        let exists = Products::find()
            .filter(ProdCol::Slug.eq(slug.as_str()))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let Some(category) = categories.iter().find(|c| c.name == seed.category) else {
            anyhow::bail!("seed product {} names unknown category {}", seed.name, seed.category);
        };

        let price = Decimal::new(seed.price_cents, 2);
        let now = Utc::now();
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            slug: Set(slug),
            description: Set(seed.description.to_string()),
            category_id: Set(category.id),
            price: Set(price),
            compare_price: Set(seed.compare_cents.map(|c| Decimal::new(c, 2))),
            cost_per_ml: Set(cost_per_ml(price, seed.size)),
            sku: Set(build_sku(&category.name, seed.name, seed.size)),
            stock: Set(seed.stock),
            low_stock_threshold: Set(5),
            is_active: Set(true),
            is_featured: Set(seed.featured),
            is_best_seller: Set(seed.best_seller),
            is_new: Set(false),
            fragrance_notes: Set(seed.notes.to_string()),
            intensity: Set(3),
            longevity: Set(3),
            size: Set(seed.size),
            gender: Set(seed.gender),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
        created += 1;
    }

    tracing::info!(categories = categories.len(), products = created, "catalog seeded");
    Ok(())
}
