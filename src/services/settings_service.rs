use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};

use crate::{
    entity::site_settings::{self, ActiveModel as SettingsActive, Entity as Settings, SETTINGS_ID},
    error::AppResult,
    models::SiteSettings,
    response::ApiResponse,
    state::AppState,
};

fn defaults() -> SettingsActive {
    SettingsActive {
        id: Set(SETTINGS_ID),
        site_name: Set("PerfumeLux".to_string()),
        site_description: Set(Some("Luxury fragrances for every occasion".to_string())),
        contact_email: Set("info@perfumelux.com".to_string()),
        phone_number: Set(None),
        address: Set(None),
        facebook_url: Set(None),
        instagram_url: Set(None),
        twitter_url: Set(None),
        tiktok_url: Set(None),
        currency: Set("USD".to_string()),
        tax_rate: Set(Decimal::ZERO),
        free_shipping_threshold: Set(Decimal::new(10000, 2)),
        standard_shipping_cost: Set(Decimal::new(599, 2)),
        meta_title: Set(None),
        meta_description: Set(None),
        updated_at: Set(Utc::now().into()),
    }
}

/// Read the settings row, inserting the defaults on first start.
pub async fn load_or_init<C: ConnectionTrait>(conn: &C) -> AppResult<site_settings::Model> {
    if let Some(row) = Settings::find_by_id(SETTINGS_ID).one(conn).await? {
        return Ok(row);
    }
    tracing::info!("site settings missing, writing defaults");
    Ok(defaults().insert(conn).await?)
}

pub fn current(state: &AppState) -> ApiResponse<SiteSettings> {
    let snapshot = state.settings();
    ApiResponse::success("OK", SiteSettings::clone(&snapshot), None)
}
