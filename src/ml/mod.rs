pub mod boosting;
pub mod classifier;
pub mod features;
pub mod logistic;
pub mod matrix;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use classifier::{stratified_split, BinaryClassifier, ClassifierBank, ClassifierKind, OneVsRest, Target};
pub use features::{edge_features, EdgeFeatureMode};
pub use logistic::{LogisticConfig, LogisticRegression};
pub use matrix::FeatureMatrix;
