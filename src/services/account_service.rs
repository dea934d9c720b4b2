use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::{
    audit,
    dto::account::{
        NewsletterPreferenceRequest, NewsletterPreferenceResponse, ProfileResponse,
        UpdateProfileRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        reviews::{Column as ReviewCol, Entity as Reviews},
        users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, User},
    response::{ApiResponse, Meta},
    services::{auth_service::normalize_email, wishlist_service},
    state::AppState,
};

const RECENT_ORDERS: u64 = 5;

async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<users::Model> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProfileResponse>> {
    let account = current_user(state, user).await?;

    let recent_orders = Orders::find()
        .filter(OrderCol::UserId.eq(account.id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let wishlist_count = wishlist_service::product_count(&state.orm, account.id).await?;
    let review_count = Reviews::find()
        .filter(ReviewCol::UserId.eq(account.id))
        .count(&state.orm)
        .await? as i64;

    let data = ProfileResponse {
        user: User::from(account),
        recent_orders,
        wishlist_count,
        review_count,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let account = current_user(state, user).await?;

    let email = payload.email.as_deref().map(normalize_email);
    if let Some(email) = email.as_deref().filter(|e| *e != account.email) {
        let taken = Users::find()
            .filter(UserCol::Email.eq(email))
            .filter(UserCol::Id.ne(account.id))
            .count(&state.orm)
            .await?;
        if taken > 0 {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }
    }

    let mut active: UserActive = account.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.trim().to_string());
    }
    if let Some(date_of_birth) = payload.date_of_birth {
        active.date_of_birth = Set(Some(date_of_birth));
    }
    active.updated_at = Set(Utc::now().into());
    let account = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(account.id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": account.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Your profile has been updated successfully!",
        User::from(account),
        Some(Meta::empty()),
    ))
}

pub async fn set_newsletter(
    state: &AppState,
    user: &AuthUser,
    payload: NewsletterPreferenceRequest,
) -> AppResult<NewsletterPreferenceResponse> {
    let account = current_user(state, user).await?;

    let mut active: UserActive = account.into();
    active.newsletter_subscribed = Set(payload.subscribed);
    active.updated_at = Set(Utc::now().into());
    let account = active.update(&state.orm).await?;

    let message = if account.newsletter_subscribed {
        "Subscribed to newsletter"
    } else {
        "Unsubscribed from newsletter"
    };
    Ok(NewsletterPreferenceResponse {
        success: true,
        message: message.to_string(),
        subscribed: account.newsletter_subscribed,
    })
}

/// Remove the account; its cart, wishlist, reviews and orders go with it.
pub async fn delete_account(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let account = current_user(state, user).await?;

    audit::record(
        &state.orm,
        Some(account.id),
        "account_delete",
        "users",
        serde_json::json!({ "user_id": account.id, "email": account.email }),
    )
    .await;

    account.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Your account has been deleted.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
