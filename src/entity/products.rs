use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bottle sizes offered, in millilitres.
pub const SIZE_CHOICES: [i32; 6] = [30, 50, 75, 100, 125, 150];

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Gender {
    #[sea_orm(string_value = "M")]
    #[serde(rename = "M")]
    Men,
    #[sea_orm(string_value = "W")]
    #[serde(rename = "W")]
    Women,
    #[sea_orm(string_value = "U")]
    #[serde(rename = "U")]
    Unisex,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    pub category_id: Uuid,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub cost_per_ml: Option<Decimal>,
    #[sea_orm(unique)]
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
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// Whole-number percentage off `compare_price`, rounded half to even.
    pub fn discount_percentage(&self) -> i32 {
        discount_percentage(self.price, self.compare_price)
    }
}

pub fn discount_percentage(price: Decimal, compare_price: Option<Decimal>) -> i32 {
    match compare_price {
        Some(compare) if compare > price => {
            let pct = (compare - price) / compare * Decimal::ONE_HUNDRED;
            pct.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i32()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Price per millilitre, kept to cents.
pub fn cost_per_ml(price: Decimal, size: i32) -> Option<Decimal> {
    if price.is_zero() || size <= 0 {
        return None;
    }
    Some((price / Decimal::from(size)).round_dp(2))
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::wishlist_items::Entity")]
    WishlistItems,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::wishlist_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn discount_is_zero_without_a_higher_compare_price() {
        assert_eq!(discount_percentage(dec("80.00"), None), 0);
        assert_eq!(discount_percentage(dec("80.00"), Some(dec("80.00"))), 0);
        assert_eq!(discount_percentage(dec("80.00"), Some(dec("60.00"))), 0);
    }

    #[test]
    fn discount_rounds_half_to_even() {
        assert_eq!(discount_percentage(dec("75.00"), Some(dec("100.00"))), 25);
        // 2.5% off rounds down to 2, 3.5% rounds up to 4
        assert_eq!(discount_percentage(dec("97.50"), Some(dec("100.00"))), 2);
        assert_eq!(discount_percentage(dec("96.50"), Some(dec("100.00"))), 4);
    }

    #[test]
    fn cost_per_ml_is_rounded_to_cents() {
        assert_eq!(cost_per_ml(dec("100.00"), 30), Some(dec("3.33")));
        assert_eq!(cost_per_ml(dec("120.00"), 100), Some(dec("1.20")));
        assert_eq!(cost_per_ml(Decimal::ZERO, 100), None);
    }
}
