use common::error::AppError;

#[derive(Debug, Clone)]
pub struct IngestionTuning {
    /// Upper bound on concurrently in-flight document pipelines, and with
    /// them the number of simultaneous external extraction calls.
    pub pool_size: usize,
    /// Records per publish batch.
    pub batch_size: usize,
    /// Sleep after each non-cached extraction call. Scheduling policy for
    /// rate-limited deployments, not a correctness requirement.
    pub extraction_pacing_ms: u64,
    pub extraction_attempts: usize,
    pub extraction_initial_backoff_ms: u64,
}

impl Default for IngestionTuning {
    fn default() -> Self {
        Self {
            pool_size: 4,
            batch_size: 8,
            extraction_pacing_ms: 0,
            extraction_attempts: 3,
            extraction_initial_backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub tuning: IngestionTuning,
}

impl IngestionConfig {
    /// Reject impossible tunings before any work starts.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tuning.pool_size == 0 {
            return Err(AppError::Config("pool_size must be at least 1".into()));
        }
        if self.tuning.batch_size == 0 {
            return Err(AppError::Config("batch_size must be at least 1".into()));
        }
        if self.tuning.extraction_attempts == 0 {
            return Err(AppError::Config(
                "extraction_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_is_valid() {
        assert!(IngestionConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let mut config = IngestionConfig::default();
        config.tuning.pool_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = IngestionConfig::default();
        config.tuning.batch_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }
}
