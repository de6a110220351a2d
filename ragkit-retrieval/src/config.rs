//! Configuration for retrieval orchestration.

use serde::{Deserialize, Serialize};

use ragkit_core::{RagError, Result};

/// Maximal-marginal-relevance re-ranking parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MmrConfig {
    /// Trade-off between relevance (1.0) and diversity (0.0).
    pub lambda: f32,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self { lambda: 0.5 }
    }
}

/// Configuration parameters for the retrieval orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Over-fetch factor applied per backend when MMR is enabled, so the
    /// diversity selection has a candidate pool larger than `k`.
    pub fetch_multiplier: usize,
    /// Diversity re-ranking; `None` keeps plain relevance order.
    pub mmr: Option<MmrConfig>,
    /// Per-backend-call timeout in milliseconds. `None` means no timeout;
    /// the right value depends on the deployment and is not guessed here.
    pub backend_timeout_ms: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { fetch_multiplier: 4, mmr: None, backend_timeout_ms: None }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the per-backend over-fetch factor used with MMR.
    pub fn fetch_multiplier(mut self, multiplier: usize) -> Self {
        self.config.fetch_multiplier = multiplier;
        self
    }

    /// Enable MMR re-ranking with the given lambda.
    pub fn mmr_lambda(mut self, lambda: f32) -> Self {
        self.config.mmr = Some(MmrConfig { lambda });
        self
    }

    /// Set the per-backend-call timeout in milliseconds.
    pub fn backend_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.backend_timeout_ms = Some(timeout_ms);
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `fetch_multiplier == 0`
    /// - the MMR lambda is outside `[0, 1]` or not finite
    pub fn build(self) -> Result<RetrievalConfig> {
        if self.config.fetch_multiplier == 0 {
            return Err(RagError::Config("fetch_multiplier must be at least 1".to_string()));
        }
        if let Some(mmr) = &self.config.mmr {
            if !mmr.lambda.is_finite() || !(0.0..=1.0).contains(&mmr.lambda) {
                return Err(RagError::Config(format!(
                    "mmr lambda ({}) must be within [0, 1]",
                    mmr.lambda
                )));
            }
        }
        Ok(self.config)
    }
}
