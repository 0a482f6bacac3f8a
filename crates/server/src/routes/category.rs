use axum::{
    Json,
    extract::{Path, State},
};
use database::services::CatalogService;
use sea_orm::prelude::Uuid;

use crate::{
    dtos::catalog::{CategoryDetailResponse, CategoryResponse},
    error::ApiError,
    response::ApiEnvelope,
    routes::class::convert_to_class_response,
    state::AppState,
};

/// Active categories in display order with their class counts
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Categories retrieved successfully", body = [CategoryResponse]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<Vec<CategoryResponse>>>, ApiError> {
    let rows = CatalogService::list_categories(&state.db).await?;

    let categories = rows
        .into_iter()
        .map(|(category, class_count)| CategoryResponse {
            id: category.id.to_string(),
            name: category.name,
            description: category.description,
            icon: category.icon,
            color: category.color,
            sort_order: category.sort_order,
            class_count,
        })
        .collect();

    Ok(ApiEnvelope::success(
        "Categories retrieved successfully",
        categories,
    ))
}

/// One category with its active classes
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = CategoryDetailResponse),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_category_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<CategoryDetailResponse>>, ApiError> {
    let (category, class_rows) = CatalogService::category_detail(&state.db, id).await?;
    let classes = CatalogService::load_context(&state.db, class_rows).await?;

    let response = CategoryDetailResponse {
        id: category.id.to_string(),
        name: category.name,
        description: category.description,
        icon: category.icon,
        color: category.color,
        classes: classes
            .into_iter()
            .map(|(class, instructor, category)| {
                convert_to_class_response(&class, Some(&instructor), Some(&category))
            })
            .collect(),
    };

    Ok(ApiEnvelope::success(
        "Category retrieved successfully",
        response,
    ))
}
