//! Column encryption: rules, algorithms, and the rewrite decorator

mod algorithm;
mod decorator;
mod rule;

pub use algorithm::{AesGcmAlgorithm, AlgorithmRegistry, EncryptAlgorithm};
pub use decorator::EncryptDecorator;
pub use rule::{ColumnRule, EncryptRule, TableRule};
