//! Rigid alignment of weighted point sets.
//!
//! Estimates the rotation, translation and optional reflection that maps a
//! moving set B onto a reference set A, tolerating missing points, extra
//! points and per-point confidence.
//!
//! # Example
//!
//! ```rust
//! use pada_map::core::Point2D;
//! use pada_map::matching::{Aligner, WeightedPoint};
//!
//! let a: Vec<WeightedPoint> = [(0.0, 0.0), (100.0, 0.0), (30.0, 80.0), (150.0, 120.0)]
//!     .iter()
//!     .map(|&(x, y)| WeightedPoint::new(Point2D::new(x, y), 0.9))
//!     .collect();
//! let b: Vec<WeightedPoint> = a
//!     .iter()
//!     .map(|wp| WeightedPoint::new(wp.position + Point2D::new(40.0, -10.0), 0.9))
//!     .collect();
//!
//! let result = Aligner::default().align(&a, &b, false);
//! assert!(result.is_aligned());
//! assert!((result.translation.x + 40.0).abs() < 1e-6);
//! ```

mod aligner;
mod config;
mod traits;
mod types;

pub use aligner::Aligner;
pub use config::AlignmentConfig;
pub use traits::PointAligner;
pub use types::{AlignmentResult, AlignmentStatus, Inlier, WeightedPoint};
