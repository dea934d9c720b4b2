use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::reviews::ReviewRequest,
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::Column as OrderCol,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{RatingStats, Review},
    response::{ApiResponse, Meta},
    services::catalog_service::find_active_product,
    state::AppState,
};

/// Mean of `ratings` to one decimal place; zero when there are none.
pub fn average_rating(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(ratings.len() as i64);
    mean.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
}

/// Rating figures for each requested product, from active reviews only.
pub async fn rating_stats<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, RatingStats>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i32)> = Reviews::find()
        .select_only()
        .column(ReviewCol::ProductId)
        .column(ReviewCol::Rating)
        .filter(ReviewCol::ProductId.is_in(product_ids.iter().copied()))
        .filter(ReviewCol::IsActive.eq(true))
        .into_tuple()
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for (product_id, rating) in rows {
        grouped.entry(product_id).or_default().push(rating);
    }

    Ok(grouped
        .into_iter()
        .map(|(product_id, ratings)| {
            let stats = RatingStats {
                average: average_rating(&ratings),
                count: ratings.len() as i64,
            };
            (product_id, stats)
        })
        .collect())
}

pub async fn product_rating<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<RatingStats> {
    let stats = rating_stats(conn, &[product_id]).await?;
    Ok(stats.get(&product_id).copied().unwrap_or_default())
}

async fn has_purchased<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<bool> {
    let count = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderItemCol::ProductId.eq(product_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Create the caller's review of a product, or overwrite the one they left before.
pub async fn submit_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    payload.validate()?;
    let product = find_active_product(&state.orm, product_id).await?;

    let existing = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product.id))
        .filter(ReviewCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let now = Utc::now();
    let (review, message, action) = match existing {
        Some(review) => {
            let mut active: ReviewActive = review.into();
            active.rating = Set(payload.rating);
            active.comment = Set(payload.comment);
            if let Some(title) = payload.title {
                active.title = Set(title);
            }
            active.updated_at = Set(now.into());
            let review = active.update(&state.orm).await?;
            (review, "Your review has been updated.", "review_update")
        }
        None => {
            let verified_purchase = has_purchased(&state.orm, user.user_id, product.id).await?;
            let review = ReviewActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                user_id: Set(user.user_id),
                rating: Set(payload.rating),
                title: Set(payload.title.unwrap_or_default()),
                comment: Set(payload.comment),
                is_active: Set(true),
                verified_purchase: Set(verified_purchase),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await?;
            (review, "Thank you for your review!", "review_create")
        }
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        action,
        "reviews",
        serde_json::json!({ "product_id": product.id, "rating": review.rating }),
    )
    .await;

    Ok(ApiResponse::success(
        message,
        Review::from(review),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::average_rating;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn average_is_rounded_to_one_decimal() {
        assert_eq!(average_rating(&[4, 5, 3]), Decimal::from_str("4.0").unwrap());
        assert_eq!(average_rating(&[1, 2, 2]), Decimal::from_str("1.7").unwrap());
        assert_eq!(average_rating(&[5, 4]), Decimal::from_str("4.5").unwrap());
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_rating(&[]), Decimal::ZERO);
    }
}
