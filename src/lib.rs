pub mod dataset;
pub mod graph;
