pub mod eval_graph;
pub mod indexes;
pub mod synthetic;

pub use eval_graph::EvalGraph;
pub use indexes::GraphIndexes;
pub use synthetic::{barbell, planted_partition, ring_of_cliques, PlantedPartition};
