pub mod engine;
pub mod page;
pub mod verdict;

pub use engine::StockInferenceEngine;
pub use verdict::{Detector, Evidence, Inference, Verdict};
