pub mod aggregator;
pub mod flatten;
