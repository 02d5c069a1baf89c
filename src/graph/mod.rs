//! Audio routing graph
//!
//! The band table and the graph that splits a media element's audio into
//! soloable frequency bands.

pub mod bands;
pub mod manager;

pub use bands::{Band, BandId, BANDS};
pub use manager::{AudioGraph, GainSnapshot};
