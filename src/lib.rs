//! DST: Dip/Strike Toolkit
//!
//! Strike/dip azimuth arithmetic and a field-role resolver for geological measurement
//! datasets, with the batch recalculation and single-measurement paths built on them.

pub mod cli;
pub mod core;
pub mod yaml;
