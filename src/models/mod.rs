pub mod outfit;
pub mod product;

pub use outfit::{
    Constraints, EnrichedOutfit, Outfit, Rationale, RationaleStatus, RecommendationRequest,
    RecommendationResponse, DEFAULT_OUTFIT_COUNT, MAX_OUTFIT_COUNT,
};
pub use product::{Product, Role};
