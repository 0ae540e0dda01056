//! Shared encryption runtime
//!
//! One `EncryptRuntime` holds the immutable pieces every session shares:
//! the table catalog, the encrypt rule, the algorithm registry, and the
//! session properties. Sessions clone the `Arc`s, never the data.

use crate::config::SessionProps;
use crate::encrypt::{AlgorithmRegistry, EncryptDecorator, EncryptRule};
use crate::rewrite::RewriteDecorator;
use crate::types::Catalog;
use std::sync::Arc;

#[derive(Clone)]
pub struct EncryptRuntime {
    pub catalog: Arc<Catalog>,
    pub rule: Arc<EncryptRule>,
    pub algorithms: Arc<AlgorithmRegistry>,
    pub props: SessionProps,
}

impl EncryptRuntime {
    pub fn new(
        catalog: Arc<Catalog>,
        rule: Arc<EncryptRule>,
        algorithms: Arc<AlgorithmRegistry>,
        props: SessionProps,
    ) -> Self {
        EncryptRuntime {
            catalog,
            rule,
            algorithms,
            props,
        }
    }

    /// The decorator chain applied to every rewrite pass, in application
    /// order.
    pub fn decorators(&self) -> Vec<Box<dyn RewriteDecorator>> {
        vec![Box::new(EncryptDecorator::new(
            Arc::clone(&self.rule),
            Arc::clone(&self.algorithms),
            self.props.query_with_cipher_column,
        ))]
    }
}
