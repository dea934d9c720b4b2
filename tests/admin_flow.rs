mod common;

use rust_decimal_macros::dec;

use perfume_storefront::{
    dto::{
        cart::AddToCartRequest,
        catalog::{
            CreateCategoryRequest, CreateProductRequest, UpdateCategoryRequest,
            UpdateProductRequest,
        },
    },
    entity::{orders::OrderStatus, products::Gender},
    error::AppError,
    routes::admin::{LowStockQuery, UpdateOrderStatusRequest, UpdateSettingsRequest},
    services::{admin_service, cart_service, order_service, settings_service},
};

use common::{admin, checkout_form, register, setup_state};

fn new_product(category_id: uuid::Uuid, name: &str, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        slug: None,
        description: "Warm and woody".to_string(),
        category_id,
        price: dec!(80),
        compare_price: Some(dec!(100)),
        sku: None,
        stock,
        low_stock_threshold: None,
        is_active: None,
        is_featured: Some(true),
        is_best_seller: None,
        is_new: None,
        fragrance_notes: "Top: bergamot".to_string(),
        intensity: Some(4),
        longevity: None,
        size: Some(50),
        gender: Some(Gender::Men),
    }
}

fn new_category(name: &str) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: name.to_string(),
        slug: None,
        description: None,
        is_active: None,
    }
}

#[tokio::test]
async fn negative_prices_are_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = admin();
    let category = admin_service::create_category(&state, &staff, new_category("Amber"))
        .await?
        .data
        .expect("category");

    let mut negative = new_product(category.id, "Amber Dusk", 5);
    negative.price = dec!(-50);
    let Err(AppError::Validation(errors)) =
        admin_service::create_product(&state, &staff, negative).await
    else {
        panic!("negative price should fail validation");
    };
    assert!(errors.field_errors().contains_key("price"));

    let mut negative_compare = new_product(category.id, "Amber Dusk", 5);
    negative_compare.compare_price = Some(dec!(-1));
    let rejected = admin_service::create_product(&state, &staff, negative_compare).await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));

    let free = new_product(category.id, "Amber Sample", 5);
    let product = admin_service::create_product(
        &state,
        &staff,
        CreateProductRequest {
            price: dec!(0),
            compare_price: None,
            ..free
        },
    )
    .await?
    .data
    .expect("product");

    let repriced = admin_service::update_product(
        &state,
        &staff,
        product.id,
        UpdateProductRequest {
            price: Some(dec!(-0.01)),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(repriced, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn renaming_a_category_onto_another_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = admin();
    admin_service::create_category(&state, &staff, new_category("Citrus")).await?;
    let green = admin_service::create_category(&state, &staff, new_category("Green"))
        .await?
        .data
        .expect("category");

    let clash = admin_service::update_category(
        &state,
        &staff,
        green.id,
        UpdateCategoryRequest {
            name: Some(" Citrus ".to_string()),
            description: None,
            is_active: None,
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::BadRequest(_))));

    let same = admin_service::update_category(
        &state,
        &staff,
        green.id,
        UpdateCategoryRequest {
            name: Some("Green".to_string()),
            description: Some("Leaves and stems".to_string()),
            is_active: None,
        },
    )
    .await?
    .data
    .expect("category");
    assert_eq!(same.name, "Green");
    Ok(())
}

#[tokio::test]
async fn staff_build_the_catalog() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = admin();

    let category = admin_service::create_category(
        &state,
        &staff,
        CreateCategoryRequest {
            name: "Woody Notes".to_string(),
            slug: None,
            description: None,
            is_active: None,
        },
    )
    .await?
    .data
    .expect("category");
    assert_eq!(category.slug, "woody-notes");

    let duplicate = admin_service::create_category(
        &state,
        &staff,
        CreateCategoryRequest {
            name: "Woody Notes".to_string(),
            slug: Some("another".to_string()),
            description: None,
            is_active: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let product = admin_service::create_product(&state, &staff, new_product(category.id, "Cedar Smoke", 20))
        .await?
        .data
        .expect("product");
    assert_eq!(product.slug, "cedar-smoke");
    assert_eq!(product.sku, "WOO-CED-50");
    assert_eq!(product.cost_per_ml, Some(dec!(1.60)));
    assert_eq!(product.discount_percentage, 20);

    let updated = admin_service::update_product(
        &state,
        &staff,
        product.id,
        UpdateProductRequest {
            price: Some(dec!(100)),
            size: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(updated.cost_per_ml, Some(dec!(1.00)));

    let odd_size = admin_service::update_product(
        &state,
        &staff,
        product.id,
        UpdateProductRequest {
            size: Some(42),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(odd_size, Err(AppError::BadRequest(_))));

    let shopper = register(&state, "curious@example.com").await?;
    let blocked = admin_service::deactivate_product(&state, &shopper, product.id).await;
    assert!(matches!(blocked, Err(AppError::Forbidden)));

    admin_service::deactivate_product(&state, &staff, product.id).await?;
    let hidden = cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: None,
        },
    )
    .await;
    assert!(matches!(hidden, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn status_updates_stamp_shipping_dates() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = admin();
    let shopper = register(&state, "parcel@example.com").await?;
    let category = common::create_category(&state, "Fresh").await?;
    let product = common::create_product(&state, &category, "Sea Glass", dec!(30), 10).await?;

    cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(1),
        },
    )
    .await?;
    let order = order_service::checkout(&state, &shopper, checkout_form())
        .await?
        .data
        .expect("order")
        .order;

    let shipped = admin_service::update_order_status(
        &state,
        &staff,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
            tracking_number: Some(" TRACK-1 ".to_string()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(shipped.tracking_number.as_deref(), Some("TRACK-1"));
    assert!(shipped.shipped_date.is_some());
    assert!(shipped.delivered_date.is_none());
    assert!(!shipped.can_be_cancelled);

    let cancel = order_service::cancel_order(&state, &shopper, order.id).await;
    assert!(matches!(cancel, Err(AppError::BadRequest(_))));

    let delivered = admin_service::update_order_status(
        &state,
        &staff,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
            tracking_number: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(delivered.shipped_date, shipped.shipped_date);
    assert!(delivered.delivered_date.is_some());
    assert_eq!(delivered.tracking_number.as_deref(), Some("TRACK-1"));
    Ok(())
}

#[tokio::test]
async fn low_stock_uses_each_products_threshold() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let staff = admin();
    let category = common::create_category(&state, "Floral").await?;
    let scarce = common::create_product(&state, &category, "Rare Iris", dec!(90), 2).await?;
    common::create_product(&state, &category, "Plenty Rose", dec!(40), 50).await?;

    let low = admin_service::list_low_stock(&state, &staff, LowStockQuery::default())
        .await?
        .data
        .expect("low stock");
    assert_eq!(low.items.len(), 1);
    assert_eq!(low.items[0].id, scarce.id);
    assert!(low.items[0].is_low_stock);

    let wide = admin_service::list_low_stock(
        &state,
        &staff,
        LowStockQuery {
            threshold: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("low stock");
    assert_eq!(wide.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn settings_update_replaces_the_live_snapshot() -> anyhow::Result<()> {
    let state = setup_state().await?;
    assert_eq!(state.settings().site_name, "PerfumeLux");

    admin_service::update_settings(
        &state,
        &admin(),
        UpdateSettingsRequest {
            site_name: Some("PerfumeLux Paris".to_string()),
            currency: Some("EUR".to_string()),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(state.settings().site_name, "PerfumeLux Paris");
    let stored = settings_service::load_or_init(&state.orm).await?;
    assert_eq!(stored.currency, "EUR");

    let invalid = admin_service::update_settings(
        &state,
        &admin(),
        UpdateSettingsRequest {
            currency: Some("EURO".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    Ok(())
}
