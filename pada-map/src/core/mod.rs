//! Core geometric types for the pada-map library.
//!
//! Everything in this module is a pure function or a plain value type.
//! Coordinates are image-space units (detector pixels), with X to the right,
//! Y downwards as delivered by the detector, and counter-clockwise positive
//! rotation in the mathematical sense. Angles are radians internally and only
//! converted to degrees at reporting boundaries.
//!
//! ## Type Categories
//!
//! - [`Point2D`]: Floating-point coordinate with vector arithmetic
//! - [`BoundingBox`]: Axis-aligned extent of a point set
//! - [`RigidTransform2D`]: Rotation + translation with optional reflection
//! - [`math`]: Angles, centroids, covariance and PCA orientation
//!
//! ## Example
//!
//! ```rust
//! use pada_map::core::{Point2D, RigidTransform2D};
//!
//! let t = RigidTransform2D::new(std::f64::consts::FRAC_PI_2, Point2D::new(10.0, 0.0));
//! let p = t.apply(Point2D::new(1.0, 0.0));
//! assert!((p.x - 10.0).abs() < 1e-9);
//! assert!((p.y - 1.0).abs() < 1e-9);
//! ```

mod bounds;
pub mod math;
mod point;
mod transform;

pub use bounds::BoundingBox;
pub use math::{angle_diff, centroid, normalize_angle, principal_orientation, weighted_centroid};
pub use point::Point2D;
pub use transform::RigidTransform2D;
