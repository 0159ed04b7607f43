pub mod edge_split;
pub mod negative;

pub use edge_split::{split, EdgeSplit, EdgeSplitter, SplitOptions};
pub use negative::{sample_negative, NegativeSampler};
