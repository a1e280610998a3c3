//! Feature extraction from detector output.
//!
//! The detector (external to this crate) turns a photograph into labelled
//! polygons. This module is the boundary that validates that payload and
//! converts it into typed per-class point observations plus the polygons
//! themselves, ready for the spatial graph.
//!
//! ## Data Flow
//!
//! ```text
//!   detector JSON ──► extract_json() ─┐
//!                                     ├─► ExtractedFeatures
//!   Vec<Prediction> ──► extract() ────┘     ├─ points by class (polygon centroids)
//!                                           ├─ contours (validated polygons)
//!                                           ├─ per-class centers
//!                                           └─ skip counts
//! ```
//!
//! Malformed items are never an error: they are dropped and counted in
//! [`SkipCounts`].

mod extractor;
mod types;

pub use extractor::{ExtractedFeatures, ExtractorConfig, FeatureExtractor, SkipCounts};
pub use types::{ClassTag, ContourObservation, PointObservation, Prediction};
