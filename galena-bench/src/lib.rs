//! Galena Benchmark Library
//!
//! Data generators and helpers shared by the criterion benchmarks.

pub mod data_gen;
