use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum ContactSubject {
    #[sea_orm(string_value = "product")]
    Product,
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "shipping")]
    Shipping,
    #[sea_orm(string_value = "return")]
    Return,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ContactSubject {
    pub fn label(self) -> &'static str {
        match self {
            ContactSubject::Product => "Product Inquiry",
            ContactSubject::Order => "Order Support",
            ContactSubject::Shipping => "Shipping Question",
            ContactSubject::Return => "Returns & Exchanges",
            ContactSubject::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: ContactSubject,
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
