//! Error types for s3v-filter

/// Result type alias for filter operations
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Errors raised while post-processing a result set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A similarity threshold was requested for results scored with a
    /// metric where `similarity = 1 - distance` does not hold
    #[error(
        "similarity threshold is only supported for distance metric 'cosine' (results use '{metric}')"
    )]
    UnsupportedMetric { metric: String },
}

impl FilterError {
    /// Name of the offending metric
    pub fn metric(&self) -> &str {
        match self {
            FilterError::UnsupportedMetric { metric } => metric,
        }
    }
}
