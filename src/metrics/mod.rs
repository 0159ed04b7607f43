pub mod classification;
pub mod partition;

pub use classification::{
    accuracy, average_precision, f1_binary, f1_multiclass, f1_multilabel, roc_auc, Confusion,
};
pub use partition::Contingency;
