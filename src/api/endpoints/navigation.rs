use axum::Json;

use crate::navigation::{NavItem, NAV_ITEMS};

/// `GET /api/navigation` — sidebar entries in display order.
pub async fn list() -> Json<&'static [NavItem]> {
    Json(&NAV_ITEMS[..])
}
