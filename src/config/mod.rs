pub mod scoring;

pub use scoring::{
    Mode, ModelsConfig, ScoringConfig, ScoringSection, DEFAULT_SCORING_CONFIG_PATH,
    ENV_CLIM_BUNDLE_PATH, ENV_GEO_BUNDLE_PATH, ENV_RULES_VERSION, ENV_SCORING_CONFIG_PATH,
};
