mod algorithm;

pub use algorithm::NaiveAlgorithm;
