//! # s3v-filter — query result post-processing
//!
//! Pure, synchronous helpers applied to the result set of an S3 Vectors
//! `QueryVectors` call after it has been materialized in memory:
//!
//! - [`apply_similarity_threshold`] drops hits whose cosine similarity
//!   (`1 - distance`) falls below a threshold, preserving order.
//! - [`validate_metadata_filter`] reports the keys of hits whose metadata
//!   does not satisfy an expected `key == value` constraint.
//!
//! Neither function performs I/O or mutates its input.
//!
//! ```
//! use s3v_filter::{
//!     apply_similarity_threshold, validate_metadata_filter, DistanceMetric, MetadataFilter,
//!     ResultSet, SearchResult,
//! };
//!
//! let results = ResultSet::new(
//!     DistanceMetric::Cosine,
//!     vec![
//!         SearchResult::new("a").with_distance(0.1).with_meta("kind", "smoke"),
//!         SearchResult::new("b").with_distance(0.5).with_meta("kind", "smoke"),
//!     ],
//! );
//!
//! let kept = apply_similarity_threshold(results, Some(0.75)).unwrap();
//! assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["a"]);
//!
//! let filter = MetadataFilter::new("kind", "smoke");
//! assert!(validate_metadata_filter(&kept, Some(&filter)).is_empty());
//! ```

pub mod error;
pub mod threshold;
pub mod types;
pub mod validate;

pub use error::{FilterError, FilterResult};
pub use threshold::apply_similarity_threshold;
pub use types::{DistanceMetric, Metadata, MetadataFilter, MetadataValue, ResultSet, SearchResult};
pub use validate::validate_metadata_filter;
