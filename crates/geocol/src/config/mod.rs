use std::time::Duration;

use crate::{
    error::GeoColError,
    search::{ScoreParams, SearchConfig},
};

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Fewer, closer matches: higher similarity threshold, shorter result list
    pub fn strict() -> Self {
        let mut builder = Self::new();
        builder.config.similarity_threshold = 0.5;
        builder.config.limit = 10;
        builder
    }

    /// Tolerate heavier misspellings and return longer result lists
    pub fn lenient() -> Self {
        let mut builder = Self::new();
        builder.config.similarity_threshold = 0.2;
        builder.config.limit = 50;
        builder
    }

    /// Set the maximum number of results to return
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the trigram similarity a name must exceed to match on its own
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the longest accepted query, in characters
    pub fn max_query_chars(mut self, max: usize) -> Self {
        self.config.max_query_chars = max;
        self
    }

    /// Abandon searches whose candidate read exceeds `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set how long cached search results stay valid
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Configure score weights
    pub fn scoring(self) -> ScoringBuilder {
        ScoringBuilder::new(self)
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<SearchConfig, GeoColError> {
        let config = self.config;
        if config.limit == 0 {
            return Err(GeoColError::ConfigError(
                "Result limit must be greater than zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&config.similarity_threshold) {
            return Err(GeoColError::ConfigError(format!(
                "Similarity threshold must be in [0, 1), got {}",
                config.similarity_threshold
            )));
        }
        if config.max_query_chars == 0 {
            return Err(GeoColError::ConfigError(
                "Maximum query length must be greater than zero".to_string(),
            ));
        }
        if config.timeout.is_some_and(|t| t.is_zero()) {
            return Err(GeoColError::ConfigError(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Builder for score weights
pub struct ScoringBuilder {
    parent: SearchConfigBuilder,
}

impl ScoringBuilder {
    fn new(parent: SearchConfigBuilder) -> Self {
        Self { parent }
    }

    /// Rank purely on how close the spelling is, ignoring word position
    pub fn similarity_only(mut self) -> Self {
        self.parent.config.score_params = ScoreParams {
            whole_word_bonus: 0.0,
            exact_bonus: 0.0,
            prefix_bonus: 0.0,
            ..ScoreParams::default()
        };
        self
    }

    /// Set custom weights.
    ///
    /// The tiers must keep their order (whole word ≥ exact ≥ prefix) and every
    /// weight must be finite and non-negative.
    pub fn custom_weights(
        mut self,
        whole_word: f64,
        exact: f64,
        prefix: f64,
        similarity: f64,
        rank: f64,
    ) -> Result<Self, GeoColError> {
        let weights = [whole_word, exact, prefix, similarity, rank];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(GeoColError::ConfigError(format!(
                "Score weights must be finite and non-negative, got {weights:?}"
            )));
        }
        if whole_word < exact || exact < prefix {
            return Err(GeoColError::ConfigError(format!(
                "Tier bonuses must not increase, got {whole_word}/{exact}/{prefix}"
            )));
        }

        self.parent.config.score_params = ScoreParams {
            whole_word_bonus: whole_word,
            exact_bonus: exact,
            prefix_bonus: prefix,
            similarity_weight: similarity,
            rank_weight: rank,
        };
        Ok(self)
    }

    /// Return to the main configuration builder
    pub fn done(self) -> SearchConfigBuilder {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let config = SearchConfigBuilder::new().build().unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.limit, 30);
        assert_eq!(config.similarity_threshold, 0.3);
        assert_eq!(config.max_query_chars, 100);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_strict_preset() {
        let config = SearchConfigBuilder::strict().build().unwrap();
        assert!(config.similarity_threshold > SearchConfig::default().similarity_threshold);
        assert_eq!(config.limit, 10);
    }

    #[test]
    fn test_lenient_preset() {
        let config = SearchConfigBuilder::lenient().build().unwrap();
        assert!(config.similarity_threshold < SearchConfig::default().similarity_threshold);
        assert_eq!(config.limit, 50);
    }

    #[test]
    fn test_method_chaining() {
        let config = SearchConfigBuilder::new()
            .limit(5)
            .similarity_threshold(0.4)
            .with_timeout(Duration::from_millis(250))
            .cache_ttl(Duration::from_secs(60))
            .scoring()
            .similarity_only()
            .done()
            .build()
            .unwrap();

        assert_eq!(config.limit, 5);
        assert_eq!(config.similarity_threshold, 0.4);
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.score_params.whole_word_bonus, 0.0);
        assert_eq!(config.score_params.similarity_weight, 1000.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SearchConfigBuilder::new().limit(0).build().is_err());
        assert!(SearchConfigBuilder::new().similarity_threshold(1.0).build().is_err());
        assert!(SearchConfigBuilder::new().similarity_threshold(-0.1).build().is_err());
        assert!(SearchConfigBuilder::new().max_query_chars(0).build().is_err());
        assert!(
            SearchConfigBuilder::new()
                .with_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_custom_weights_validation() {
        let ok = SearchConfigBuilder::new()
            .scoring()
            .custom_weights(20_000.0, 5_000.0, 500.0, 1_000.0, 100.0);
        assert!(ok.is_ok());

        let negative = SearchConfigBuilder::new()
            .scoring()
            .custom_weights(10_000.0, 5_000.0, -1.0, 1_000.0, 100.0);
        assert!(negative.is_err());

        let inverted = SearchConfigBuilder::new()
            .scoring()
            .custom_weights(1_000.0, 5_000.0, 10_000.0, 1_000.0, 100.0);
        assert!(inverted.is_err());

        let nan = SearchConfigBuilder::new()
            .scoring()
            .custom_weights(f64::NAN, 5_000.0, 1_000.0, 1_000.0, 100.0);
        assert!(nan.is_err());
    }
}
