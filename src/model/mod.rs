//! Binary anomaly classifier: a seeded random forest trained on the feature table.

mod adapter;
mod artifact;
mod eval;
mod forest;
mod tree;

pub use adapter::{
    ensure_inference_labels, ensure_training_labels, feature_matrix, predict, synthetic_label,
    train, LabelSource, Prediction, TrainOutcome,
};
pub use artifact::{load_model, save_model};
pub use eval::{train_test_split, ClassMetrics, ClassificationReport};
pub use forest::RandomForest;
pub use tree::DecisionTree;
