//! Category endpoints.
//!
//! - `GET /api/categories`: the catalogue
//! - `GET /api/categories/:id/professionals`: one page of a category

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::categories::{self, Category, CATEGORIES};
use crate::marketplace::{self, CATEGORY_PAGE_LIMIT};
use crate::models::ProfessionalWithProfile;

/// Largest page a client may request.
const MAX_PAGE: u32 = 100;

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: &'static [Category],
}

/// `GET /api/categories`
pub async fn list() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: CATEGORIES,
    })
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct CategoryPageResponse {
    /// Catalogue entry, absent for categories outside the catalogue.
    pub category: Option<&'static Category>,
    pub professionals: Vec<ProfessionalWithProfile>,
    pub limit: u32,
    pub offset: u32,
}

/// `GET /api/categories/:id/professionals?limit&offset`
pub async fn professionals(
    State(ctx): State<ApiContext>,
    Path(category_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<CategoryPageResponse>, ApiError> {
    let limit = page.limit.unwrap_or(CATEGORY_PAGE_LIMIT).clamp(1, MAX_PAGE);
    let offset = page.offset.unwrap_or(0);

    let category = categories::find(&category_id);
    let professionals = ctx
        .blocking(move |backend| {
            marketplace::get_professionals_by_category(backend, &category_id, limit, offset)
        })
        .await?;

    Ok(Json(CategoryPageResponse {
        category,
        professionals,
        limit,
        offset,
    }))
}
