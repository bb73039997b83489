mod health;
mod items;
mod merchants;
mod search;

#[cfg(test)]
mod tests;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/merchants", get(merchants::list_merchants))
        .route("/api/v1/merchants/find", get(search::find_merchant))
        .route("/api/v1/merchants/:id", get(merchants::merchant_detail))
        .route("/api/v1/merchants/:id/items", get(merchants::merchant_items))
        .route(
            "/api/v1/items",
            get(items::list_items).post(items::create_item),
        )
        .route("/api/v1/items/find_all", get(search::find_all_items))
        .route(
            "/api/v1/items/:id",
            get(items::item_detail)
                .patch(items::update_item)
                .delete(items::delete_item),
        )
        .route("/api/v1/items/:id/merchant", get(items::item_merchant))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
