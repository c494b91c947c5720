pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod normalize;
pub mod scoring;
pub mod snippets;

pub use domain::behavior::{BehaviorEntry, Preferences, UserBehaviorProfile};
pub use domain::interaction::{InteractionId, InteractionProduct, InteractionType, UserInteraction};
pub use domain::product::{Product, ProductDraft, ProductId};
pub use domain::upload::{CatalogUpload, UploadId, UploadStatus};
pub use errors::{ApplicationError, DomainError, ExternalServiceError, InterfaceError};
pub use extraction::{
    CandidateProduct, ExtractionOutcome, ExtractionStrategy, ExtractorChain, StrategyKind,
};
pub use normalize::Normalizer;
pub use scoring::{score_and_rank, MatchedSignal, ScoredProduct, DEFAULT_TOP_N};
