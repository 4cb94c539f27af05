use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Constraints, RecommendationRequest, RecommendationResponse, DEFAULT_OUTFIT_COUNT},
};

use super::AppState;

/// Raw query string; values are validated in [`RecommendationQuery::into_request`]
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    base_sku: Option<String>,
    budget: Option<String>,
    season: Option<String>,
    occasion: Option<String>,
    count: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RecommendationQuery {
    pub fn into_request(self) -> AppResult<RecommendationRequest> {
        let base_sku = non_empty(&self.base_sku)
            .ok_or_else(|| AppError::InvalidInput("base_sku is required".to_string()))?;

        let budget = match non_empty(&self.budget) {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(b) if b.is_finite() && b > 0.0 => Some(b),
                _ => {
                    return Err(AppError::InvalidInput(
                        "budget must be a positive number".to_string(),
                    ))
                }
            },
        };

        let count = match non_empty(&self.count) {
            None => DEFAULT_OUTFIT_COUNT,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::InvalidInput("count must be an integer".to_string()))?
                .max(0) as usize,
        };

        let constraints = Constraints::new(
            budget,
            non_empty(&self.season),
            non_empty(&self.occasion),
        );

        Ok(RecommendationRequest::new(base_sku, constraints, count))
    }
}

/// Handler for outfit recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let request = params.into_request()?;
    let response = state.service.recommend(request).await?;
    Ok(Json(response))
}
