pub mod enrichment;
pub mod fingerprint;
pub mod outfit_search;
pub mod providers;
pub mod recommendations;
pub mod sampler;
pub mod scorer;
pub mod selector;

pub use outfit_search::{OutfitSearch, SearchStats};
pub use providers::{build_generator, ProviderConfig, ProviderKind, TextGenerator};
pub use recommendations::RecommendationService;
