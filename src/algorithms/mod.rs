pub mod agglomerative;
pub mod components;

pub use agglomerative::{AgglomerativeClustering, Linkage, Merge};
pub use components::{UnionFind, WeaklyConnectedComponents};
