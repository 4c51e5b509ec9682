//! Random forests over X-of-N composite attributes.
//!
//! An X-of-N attribute is an ordered list of `(feature, threshold)`
//! conditions; its value for a row is how many of those conditions the row
//! satisfies. Splitting on that count lets a single node express concepts
//! like "at least 2 of these 3 tests hold", which an axis-parallel tree
//! needs several levels to approximate. Composites are grown per node by a
//! greedy local search that trades Gini impurity against an MDL-based
//! complexity cost.
//!
//! The crate exposes two layers:
//!
//! - [`XOfNTreeConfig`] / [`XOfNTree`] — a single decision tree over
//!   already-encoded class indices.
//! - [`XOfNForestConfig`] / [`RandomXOfNForest`] — a bagged ensemble over
//!   arbitrary `i64` labels, trained across a worker pool.
//!
//! # Example
//!
//! ```
//! use xofn_rf::{MaxFeatures, NJobs, RandomXOfNForest, XOfNForestConfig};
//!
//! let features: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
//! let labels: Vec<i64> = (0..20).map(|i| i64::from(i >= 10)).collect();
//!
//! let config = XOfNForestConfig::new(10)?
//!     .with_max_features(MaxFeatures::All)
//!     .with_n_jobs(NJobs::Fixed(2))
//!     .with_random_state(Some(42));
//!
//! let mut forest = RandomXOfNForest::new(config);
//! forest.fit(&features, &labels)?;
//!
//! let predictions = forest.predict(&[vec![2.0], vec![17.0]])?;
//! assert_eq!(predictions, vec![0, 1]);
//! # Ok::<(), xofn_rf::XofnError>(())
//! ```

mod attribute;
mod config;
mod cost;
mod dataset;
mod error;
mod forest;
mod gini;
mod node;
mod search;
mod tree;

pub use attribute::XOfNAttribute;
pub use config::{MaxFeatures, MinSamplesLeaf, NJobs, SampleSize, XOfNForestConfig};
pub use error::XofnError;
pub use forest::RandomXOfNForest;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use tree::{XOfNTree, XOfNTreeConfig};
