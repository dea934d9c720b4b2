mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use perfume_storefront::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        reviews::ReviewRequest,
        wishlist::ToggleWishlistRequest,
    },
    entity::{
        orders::OrderStatus,
        products::ActiveModel as ProductActive,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::AppError,
    routes::{admin::InventoryAdjustRequest, params::OrderListQuery},
    services::{admin_service, cart_service, order_service, review_service, wishlist_service},
};

use common::{checkout_form, create_category, create_product, register, setup_state};

fn add(product_id: uuid::Uuid, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity: Some(quantity),
    }
}

#[tokio::test]
async fn adding_same_product_twice_merges_the_line() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "merge@example.com").await?;
    let category = create_category(&state, "Floral").await?;
    let product = create_product(&state, &category, "Midnight Rose", dec!(10), 20).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, 2)).await?;
    let second = cart_service::add_to_cart(&state, &user, add(product.id, 3)).await?;
    assert_eq!(second.cart_count, 5);

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.subtotal, dec!(50));

    // Carts follow the live price until checkout.
    let mut repriced: ProductActive = product.clone().into();
    repriced.price = Set(dec!(12));
    repriced.update(&state.orm).await?;
    assert_eq!(cart_service::subtotal(&state.orm, cart.id).await?, dec!(60));

    let updated = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest {
            item_id: cart.items[0].id,
            quantity: 0,
        },
    )
    .await?;
    assert_eq!(updated.message, "Item removed from cart");
    assert_eq!(updated.cart_count, 0);
    assert_eq!(updated.item_total, Some(Decimal::ZERO));

    let rejected = cart_service::add_to_cart(&state, &user, add(product.id, 0)).await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn racing_insert_folds_into_the_existing_line() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "race@example.com").await?;
    let category = create_category(&state, "Fresh").await?;
    let product = create_product(&state, &category, "Sea Glass", dec!(8), 20).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, 2)).await?;
    let cart = cart_service::get_or_create_cart(&state.orm, user.user_id).await?;

    // Same outcome as a second writer that lost the race to create the line.
    let line = cart_service::insert_line(&state.orm, cart.id, product.id, 3).await?;
    assert_eq!(line.quantity, 5);
    let view = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.item_count, 5);
    Ok(())
}

#[tokio::test]
async fn line_quantities_are_capped() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "bulk@example.com").await?;
    let category = create_category(&state, "Woody").await?;
    let product = create_product(&state, &category, "Cedar Trail", dec!(40), 5).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, 5)).await?;
    let overflow = cart_service::add_to_cart(
        &state,
        &user,
        add(product.id, cart_service::MAX_LINE_QUANTITY),
    )
    .await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))));

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.item_count, 5);

    let too_many = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest {
            item_id: cart.items[0].id,
            quantity: i32::MAX,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn clearing_ordered_lines_keeps_later_additions() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "late@example.com").await?;
    let category = create_category(&state, "Floral").await?;
    let ordered = create_product(&state, &category, "Jasmine Veil", dec!(30), 10).await?;
    let late = create_product(&state, &category, "Peony Mist", dec!(20), 10).await?;

    cart_service::add_to_cart(&state, &user, add(ordered.id, 1)).await?;
    let cart = cart_service::get_or_create_cart(&state.orm, user.user_id).await?;
    let snapshot: Vec<uuid::Uuid> = cart_service::cart_lines(&state.orm, cart.id)
        .await?
        .iter()
        .map(|(line, _)| line.id)
        .collect();

    cart_service::add_to_cart(&state, &user, add(late.id, 2)).await?;

    let removed = cart_service::clear_lines(&state.orm, cart.id, &snapshot).await?;
    assert_eq!(removed, 1);
    let remaining = cart_service::cart_lines(&state.orm, cart.id).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].1.id, late.id);
    assert_eq!(remaining[0].0.quantity, 2);
    Ok(())
}

#[tokio::test]
async fn cart_lines_of_another_user_are_forbidden() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = register(&state, "owner@example.com").await?;
    let other = register(&state, "other@example.com").await?;
    let category = create_category(&state, "Woody").await?;
    let product = create_product(&state, &category, "Cedar Trail", dec!(20), 5).await?;

    cart_service::add_to_cart(&state, &owner, add(product.id, 1)).await?;
    let cart = cart_service::view_cart(&state, &owner).await?.data.expect("cart");

    let result = cart_service::update_item(
        &state,
        &other,
        UpdateCartItemRequest {
            item_id: cart.items[0].id,
            quantity: 4,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn wishlist_toggle_flips_membership() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "wish@example.com").await?;
    let category = create_category(&state, "Fresh").await?;
    let product = create_product(&state, &category, "Sea Glass", dec!(30), 5).await?;

    let first = wishlist_service::toggle_product(
        &state,
        &user,
        ToggleWishlistRequest {
            product_id: product.id,
        },
    )
    .await?;
    assert!(first.is_in_wishlist);
    assert_eq!(first.message, "Added to wishlist");
    assert!(wishlist_service::check(&state, &user, product.id).await?.is_in_wishlist);

    let second = wishlist_service::toggle_product(
        &state,
        &user,
        ToggleWishlistRequest {
            product_id: product.id,
        },
    )
    .await?;
    assert!(!second.is_in_wishlist);
    assert_eq!(wishlist_service::product_count(&state.orm, user.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn checkout_snapshots_prices_and_empties_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "buyer@example.com").await?;
    let category = create_category(&state, "Oriental").await?;
    let oud = create_product(&state, &category, "Oud Al Layl", dec!(10), 10).await?;
    let vanilla = create_product(&state, &category, "Vanilla Ember", dec!(5), 10).await?;

    cart_service::add_to_cart(&state, &user, add(oud.id, 2)).await?;
    cart_service::add_to_cart(&state, &user, add(vanilla.id, 1)).await?;

    let placed = order_service::checkout(&state, &user, checkout_form()).await?;
    let result = placed.data.expect("checkout result");
    assert_eq!(result.order.subtotal, dec!(25));
    assert_eq!(result.order.total, dec!(25));
    assert_eq!(result.order.status, OrderStatus::Pending);
    assert_eq!(result.items.len(), 2);
    assert!(result.order.order_number.starts_with("ORD-"));
    assert_eq!(
        placed.message,
        format!("Order {} has been placed successfully!", result.order.order_number)
    );
    assert_eq!(cart_service::cart_count(&state, &user).await?.count, 0);

    let mut repriced: ProductActive = oud.clone().into();
    repriced.price = Set(dec!(20));
    repriced.update(&state.orm).await?;

    let stored = order_service::get_order(&state, &user, result.order.id)
        .await?
        .data
        .expect("order");
    let oud_line = stored
        .items
        .iter()
        .find(|item| item.product_id == oud.id)
        .expect("oud line");
    assert_eq!(oud_line.price, dec!(10));
    assert_eq!(oud_line.total_price, dec!(20));
    assert_eq!(stored.item_count, 3);
    Ok(())
}

#[tokio::test]
async fn invalid_checkout_form_leaves_cart_untouched() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "invalid@example.com").await?;
    let category = create_category(&state, "Floral").await?;
    let product = create_product(&state, &category, "Jasmine Veil", dec!(15), 10).await?;
    cart_service::add_to_cart(&state, &user, add(product.id, 3)).await?;

    let mut form = checkout_form();
    form.email = "not-an-email".to_string();
    form.city = "   ".to_string();
    let result = order_service::checkout(&state, &user, form).await;
    let Err(AppError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    let fields = errors.field_errors();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("city"));

    assert_eq!(cart_service::cart_count(&state, &user).await?.count, 3);
    let orders = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert!(orders.data.expect("orders").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "empty@example.com").await?;

    let result = order_service::checkout(&state, &user, checkout_form()).await;
    match result {
        Err(AppError::BadRequest(message)) => assert_eq!(message, "Your cart is empty"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.message)),
    }
    Ok(())
}

#[tokio::test]
async fn reorder_merges_into_existing_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "again@example.com").await?;
    let category = create_category(&state, "Woody").await?;
    let first = create_product(&state, &category, "Cedar Trail", dec!(40), 10).await?;
    let second = create_product(&state, &category, "Vetiver Smoke", dec!(35), 10).await?;

    cart_service::add_to_cart(&state, &user, add(first.id, 2)).await?;
    cart_service::add_to_cart(&state, &user, add(second.id, 1)).await?;
    let order = order_service::checkout(&state, &user, checkout_form())
        .await?
        .data
        .expect("order")
        .order;

    cart_service::add_to_cart(&state, &user, add(first.id, 1)).await?;
    let reordered = order_service::reorder(&state, &user, order.id).await?;
    assert!(reordered.success);
    assert_eq!(reordered.cart_count, Some(4));

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    let quantity_of = |id| {
        cart.items
            .iter()
            .find(|line| line.product.id == id)
            .map(|line| line.quantity)
    };
    assert_eq!(cart.items.len(), 2);
    assert_eq!(quantity_of(first.id), Some(3));
    assert_eq!(quantity_of(second.id), Some(1));
    Ok(())
}

#[tokio::test]
async fn cancelling_is_limited_to_open_orders() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = register(&state, "cancel@example.com").await?;
    let category = create_category(&state, "Fresh").await?;
    let product = create_product(&state, &category, "Citrus Bloom", dec!(25), 10).await?;
    cart_service::add_to_cart(&state, &user, add(product.id, 1)).await?;
    let order = order_service::checkout(&state, &user, checkout_form())
        .await?
        .data
        .expect("order")
        .order;
    assert!(order.can_be_cancelled);

    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let again = order_service::cancel_order(&state, &user, order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let stranger = register(&state, "stranger@example.com").await?;
    let hidden = order_service::get_order(&state, &stranger, order.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn reviews_average_and_update_in_place() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Oriental").await?;
    let product = create_product(&state, &category, "Amber Nights", dec!(60), 10).await?;

    let empty = review_service::product_rating(&state.orm, product.id).await?;
    assert_eq!(empty.average, Decimal::ZERO);
    assert_eq!(empty.count, 0);

    let mut reviewers = Vec::new();
    for (index, rating) in [4, 5, 3].into_iter().enumerate() {
        let user = register(&state, &format!("reviewer{index}@example.com")).await?;
        let response = review_service::submit_review(
            &state,
            &user,
            product.id,
            ReviewRequest {
                rating,
                title: Some("Lovely".to_string()),
                comment: "Lasts all day".to_string(),
            },
        )
        .await?;
        assert_eq!(response.message, "Thank you for your review!");
        reviewers.push(user);
    }

    let stats = review_service::product_rating(&state.orm, product.id).await?;
    assert_eq!(stats.average, dec!(4.0));
    assert_eq!(stats.count, 3);

    let updated = review_service::submit_review(
        &state,
        &reviewers[2],
        product.id,
        ReviewRequest {
            rating: 5,
            title: None,
            comment: "Grew on me".to_string(),
        },
    )
    .await?;
    assert_eq!(updated.message, "Your review has been updated.");
    let review = updated.data.expect("review");
    assert_eq!(review.title, "Lovely");
    assert!(!review.verified_purchase);

    let stats = review_service::product_rating(&state.orm, product.id).await?;
    assert_eq!(stats.count, 3);
    assert_eq!(stats.average, dec!(4.7));

    // A hidden review no longer counts toward the rating.
    let hidden = Reviews::find()
        .filter(ReviewCol::UserId.eq(reviewers[1].user_id))
        .filter(ReviewCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?
        .expect("second review");
    let mut hidden: ReviewActive = hidden.into();
    hidden.is_active = Set(false);
    hidden.update(&state.orm).await?;

    let stats = review_service::product_rating(&state.orm, product.id).await?;
    assert_eq!(stats.count, 2);
    assert_eq!(stats.average, dec!(4.5));

    let out_of_range = review_service::submit_review(
        &state,
        &reviewers[0],
        product.id,
        ReviewRequest {
            rating: 6,
            title: None,
            comment: "Too good".to_string(),
        },
    )
    .await;
    assert!(matches!(out_of_range, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn inventory_adjustment_never_goes_negative() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = common::admin();
    let category = create_category(&state, "Floral").await?;
    let product = create_product(&state, &category, "Peony Mist", dec!(45), 4).await?;

    let raised = admin_service::adjust_inventory(
        &state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: 6 },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(raised.stock, 10);

    let too_far = admin_service::adjust_inventory(
        &state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: -11 },
    )
    .await;
    assert!(matches!(too_far, Err(AppError::BadRequest(_))));

    let shopper = register(&state, "sneaky@example.com").await?;
    let forbidden = admin_service::adjust_inventory(
        &state,
        &shopper,
        product.id,
        InventoryAdjustRequest { delta: 1 },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));
    Ok(())
}
