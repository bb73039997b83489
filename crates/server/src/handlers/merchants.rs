use axum::Json;
use axum::extract::{
    Path as AxumPath,
    Query,
    State
};

use crate::app_state::AppState;
use crate::errors::ServerError;
use crate::models::ShowQuery;
use crate::serializer::{self, Collection, ItemAttributes, MerchantAttributes, Single};

pub async fn list_merchants(
    State(state): State<AppState>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<Collection<MerchantAttributes>>, ServerError> {
    if query.is_invalid() {
        return Err(ServerError::invalid_parameter());
    }

    let merchants = state.merchants.list_merchants().await?;
    Ok(Json(serializer::many(&merchants)))
}

pub async fn merchant_detail(
    State(state): State<AppState>,
    AxumPath(merchant_id): AxumPath<i64>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<Single<MerchantAttributes>>, ServerError> {
    if query.is_invalid() {
        return Err(ServerError::invalid_parameter());
    }

    let merchant = state
        .merchants
        .get_merchant(merchant_id)
        .await?
        .ok_or_else(|| ServerError::not_found("Merchant", merchant_id))?;

    Ok(Json(serializer::one(&merchant)))
}

pub async fn merchant_items(
    State(state): State<AppState>,
    AxumPath(merchant_id): AxumPath<i64>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<Collection<ItemAttributes>>, ServerError> {
    if query.is_invalid() {
        return Err(ServerError::invalid_parameter());
    }

    let items = state
        .items
        .list_items_for_merchant(merchant_id)
        .await?
        .ok_or_else(|| ServerError::not_found("Merchant", merchant_id))?;

    Ok(Json(serializer::many(&items)))
}
