use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::wishlist::{ToggleWishlistRequest, WishlistStatus, WishlistToggleResponse, WishlistView},
    entity::{
        products::{Column as ProdCol, Entity as Products},
        wishlist_items::{self, ActiveModel as WishlistItemActive, Column as WishlistItemCol, Entity as WishlistItems},
        wishlists::{self, ActiveModel as WishlistActive, Column as WishlistCol, Entity as Wishlists},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::{
        cart_service::is_unique_violation,
        catalog_service::{find_active_product, with_ratings},
    },
    state::AppState,
};

pub async fn get_or_create_wishlist<C>(conn: &C, user_id: Uuid) -> AppResult<wishlists::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(wishlist) = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(wishlist);
    }

    let now = Utc::now();
    let inner = conn.begin().await?;
    let created = WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&inner)
    .await;

    match created {
        Ok(wishlist) => {
            inner.commit().await?;
            Ok(wishlist)
        }
        Err(err) if is_unique_violation(&err) => {
            inner.rollback().await?;
            Wishlists::find()
                .filter(WishlistCol::UserId.eq(user_id))
                .one(conn)
                .await?
                .ok_or(AppError::NotFound)
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    wishlist_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<wishlist_items::Model>> {
    Ok(WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist_id))
        .filter(WishlistItemCol::ProductId.eq(product_id))
        .one(conn)
        .await?)
}

/// Flip membership of a product; returns whether it is now in the wishlist.
pub async fn toggle<C: ConnectionTrait>(
    conn: &C,
    wishlist: &wishlists::Model,
    product_id: Uuid,
) -> AppResult<bool> {
    let product = find_active_product(conn, product_id).await?;

    if let Some(entry) = find_entry(conn, wishlist.id, product.id).await? {
        entry.delete(conn).await?;
        return Ok(false);
    }

    let inserted = WishlistItemActive {
        id: Set(Uuid::new_v4()),
        wishlist_id: Set(wishlist.id),
        product_id: Set(product.id),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(_) => Ok(true),
        // A concurrent toggle already added it.
        Err(err) if is_unique_violation(&err) => Ok(true),
        Err(err) => Err(err.into()),
    }
}

pub async fn toggle_product(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleWishlistRequest,
) -> AppResult<WishlistToggleResponse> {
    let wishlist = get_or_create_wishlist(&state.orm, user.user_id).await?;
    let is_in_wishlist = toggle(&state.orm, &wishlist, payload.product_id).await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %payload.product_id,
        is_in_wishlist,
        "wishlist toggled"
    );

    let message = if is_in_wishlist {
        "Added to wishlist"
    } else {
        "Removed from wishlist"
    };
    Ok(WishlistToggleResponse {
        success: true,
        message: message.to_string(),
        is_in_wishlist,
    })
}

pub async fn check(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<WishlistStatus> {
    let product = find_active_product(&state.orm, product_id).await?;
    let wishlist = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let is_in_wishlist = match wishlist {
        Some(wishlist) => find_entry(&state.orm, wishlist.id, product.id).await?.is_some(),
        None => false,
    };
    Ok(WishlistStatus { is_in_wishlist })
}

pub async fn product_count<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<i64> {
    let Some(wishlist) = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user_id))
        .one(conn)
        .await?
    else {
        return Ok(0);
    };

    let count = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id))
        .count(conn)
        .await?;
    Ok(count as i64)
}

pub async fn view_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistView>> {
    let wishlist = get_or_create_wishlist(&state.orm, user.user_id).await?;

    let product_ids: Vec<Uuid> = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id))
        .order_by_desc(WishlistItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|entry| entry.product_id)
        .collect();

    let mut models = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.clone()))
        .filter(ProdCol::IsActive.eq(true))
        .all(&state.orm)
        .await?;
    models.sort_by_key(|m| product_ids.iter().position(|id| *id == m.id));

    let items = with_ratings(&state.orm, models).await?;
    let data = WishlistView {
        id: wishlist.id,
        product_count: items.len() as i64,
        items,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}
