use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{
    Path as AxumPath,
    Query,
    State
};
use axum::http::StatusCode;

use crate::app_state::AppState;
use crate::errors::ServerError;
use crate::models::{ItemPatch, ItemPayload, NewItem, ShowQuery};
use crate::serializer::{self, Collection, ItemAttributes, MerchantAttributes, Single};

pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<Collection<ItemAttributes>>, ServerError> {
    if query.is_invalid() {
        return Err(ServerError::invalid_parameter());
    }

    let items = state.items.list_items().await?;
    Ok(Json(serializer::many(&items)))
}

pub async fn item_detail(
    State(state): State<AppState>,
    AxumPath(item_id): AxumPath<i64>,
    Query(query): Query<ShowQuery>,
) -> Result<Json<Single<ItemAttributes>>, ServerError> {
    if query.is_invalid() {
        return Err(ServerError::invalid_parameter());
    }

    let item = state
        .items
        .get_item(item_id)
        .await?
        .ok_or_else(|| ServerError::not_found("Item", item_id))?;

    Ok(Json(serializer::one(&item)))
}

pub async fn item_merchant(
    State(state): State<AppState>,
    AxumPath(item_id): AxumPath<i64>,
) -> Result<Json<Single<MerchantAttributes>>, ServerError> {
    let item = state
        .items
        .get_item(item_id)
        .await?
        .ok_or_else(|| ServerError::not_found("Item", item_id))?;

    let merchant = state
        .merchants
        .get_merchant(item.merchant_id)
        .await?
        .ok_or_else(|| ServerError::not_found("Merchant", item.merchant_id))?;

    Ok(Json(serializer::one(&merchant)))
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<ItemPayload<NewItem>>, JsonRejection>,
) -> Result<(StatusCode, Json<Single<ItemAttributes>>), ServerError> {
    let Json(payload) = payload.map_err(rejected_body)?;

    let item = state.items.create_item(payload.into_inner()).await?;
    Ok((StatusCode::CREATED, Json(serializer::one(&item))))
}

pub async fn update_item(
    State(state): State<AppState>,
    AxumPath(item_id): AxumPath<i64>,
    payload: Result<Json<ItemPayload<ItemPatch>>, JsonRejection>,
) -> Result<Json<Single<ItemAttributes>>, ServerError> {
    let Json(payload) = payload.map_err(rejected_body)?;

    let item = state
        .items
        .update_item(item_id, payload.into_inner())
        .await?
        .ok_or_else(|| ServerError::not_found("Item", item_id))?;

    Ok(Json(serializer::one(&item)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    AxumPath(item_id): AxumPath<i64>,
) -> Result<StatusCode, ServerError> {
    if !state.items.delete_item(item_id).await? {
        return Err(ServerError::not_found("Item", item_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn rejected_body(rejection: JsonRejection) -> ServerError {
    ServerError::new(rejection.status(), rejection.body_text())
}
