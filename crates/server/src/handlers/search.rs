use axum::Json;
use axum::extract::{
    Query,
    State
};

use crate::app_state::AppState;
use crate::errors::ServerError;
use crate::models::{ItemSearchQuery, MerchantSearchQuery};
use crate::serializer::{self, Collection, ItemAttributes, MerchantAttributes, Single};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// First merchant by name order whose name contains the fragment. No match
/// is still a success and renders the unsaved placeholder.
pub async fn find_merchant(
    State(state): State<AppState>,
    Query(query): Query<MerchantSearchQuery>,
) -> Result<Json<Single<MerchantAttributes>>, ServerError> {
    let name = non_blank(&query.name)
        .ok_or_else(|| ServerError::bad_request("invalid search parameters: name is required"))?;

    let merchants = state.merchants.find_merchants_by_name(name).await?;

    match merchants.first() {
        Some(merchant) => Ok(Json(serializer::one(merchant))),
        None => {
            tracing::debug!(name, "merchant search had no match");
            Ok(Json(serializer::empty_merchant()))
        }
    }
}

pub async fn find_all_items(
    State(state): State<AppState>,
    Query(query): Query<ItemSearchQuery>,
) -> Result<Json<Collection<ItemAttributes>>, ServerError> {
    let items = match (non_blank(&query.name), non_blank(&query.min_price)) {
        (Some(name), None) => state.items.find_items_by_name(name).await?,
        (None, Some(raw)) => {
            let min = parse_min_price(raw)?;
            state.items.find_items_by_min_price(min).await?
        }
        (Some(_), Some(_)) => {
            return Err(ServerError::bad_request(
                "invalid search parameters: name and min_price cannot be combined",
            ));
        }
        (None, None) => {
            return Err(ServerError::bad_request(
                "invalid search parameters: name or min_price is required",
            ));
        }
    };

    Ok(Json(serializer::many(&items)))
}

fn parse_min_price(raw: &str) -> Result<f64, ServerError> {
    let min: f64 = raw.parse().map_err(|_| {
        ServerError::bad_request(format!("invalid search parameters: min_price '{raw}' is not a number"))
    })?;

    if !min.is_finite() {
        return Err(ServerError::bad_request(format!(
            "invalid search parameters: min_price '{raw}' is not a number"
        )));
    }
    if min < 0.0 {
        return Err(ServerError::bad_request(
            "invalid search parameters: min_price must be greater than or equal to 0",
        ));
    }
    Ok(min)
}
