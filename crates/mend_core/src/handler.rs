//! Error-kind to strategy registry and dispatch.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use mend_deps::DependencyManager;
use tracing::{debug, error, info, warn};

use crate::classify::Classify;
use crate::record::ErrorKind;
use crate::strategies::{
    ImportFailureStrategy, IndentationDiagnosticStrategy, MissingModuleStrategy,
    SyntaxDiagnosticStrategy,
};
use crate::strategy::{RemediationOutcome, RemediationStrategy};

/// A registry of remediation strategies keyed by error kind.
///
/// Each kind has at most one strategy; registering again replaces it.
/// The registry is owned by one handler and mutated through `&mut self`.
#[derive(Default)]
pub struct ErrorHandler {
    strategies: HashMap<ErrorKind, Arc<dyn RemediationStrategy>>,
}

impl ErrorHandler {
    /// Create a new empty handler.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create a handler with the built-in strategies registered.
    pub fn with_builtins(deps: Arc<DependencyManager>) -> Self {
        let mut handler = Self::new();
        handler.register(
            ErrorKind::MissingDependency,
            Arc::new(MissingModuleStrategy::new(deps)),
        );
        handler.register(ErrorKind::ImportFailure, Arc::new(ImportFailureStrategy));
        handler.register(ErrorKind::SyntaxDefect, Arc::new(SyntaxDiagnosticStrategy));
        handler.register(
            ErrorKind::IndentationDefect,
            Arc::new(IndentationDiagnosticStrategy),
        );
        handler
    }

    /// Bind `strategy` to `kind`, returning the strategy it replaced.
    pub fn register(
        &mut self,
        kind: ErrorKind,
        strategy: Arc<dyn RemediationStrategy>,
    ) -> Option<Arc<dyn RemediationStrategy>> {
        let name = strategy.name().to_string();
        let previous = self.strategies.insert(kind.clone(), strategy);
        match &previous {
            Some(old) => warn!(
                "Replaced remediation strategy for {}: {} -> {}",
                kind,
                old.name(),
                name
            ),
            None => info!("Registered remediation strategy for {}: {}", kind, name),
        }
        previous
    }

    /// Remove the strategy bound to `kind`.
    pub fn unregister(&mut self, kind: &ErrorKind) -> Option<Arc<dyn RemediationStrategy>> {
        debug!("Unregistering remediation strategy for {}", kind);
        self.strategies.remove(kind)
    }

    pub fn strategy(&self, kind: &ErrorKind) -> Option<Arc<dyn RemediationStrategy>> {
        self.strategies.get(kind).cloned()
    }

    pub fn has_strategy(&self, kind: &ErrorKind) -> bool {
        self.strategies.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        let mut kinds: Vec<_> = self.strategies.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Classify `error` and run the strategy registered for its kind.
    ///
    /// Never propagates: a strategy that errors or panics yields `None`,
    /// as does a kind with no strategy.
    pub async fn handle<E: Classify>(&self, error: E) -> Option<RemediationOutcome> {
        let record = error.classify();
        error!("{}: {}", record.kind, record.message);

        let Some(strategy) = self.strategy(&record.kind) else {
            warn!("No remediation registered for kind {}", record.kind);
            return None;
        };

        debug!("Dispatching {} to {}", record.kind, strategy.name());
        match AssertUnwindSafe(strategy.remediate(&record))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => {
                info!("Remediation {} finished: {}", strategy.name(), outcome);
                Some(outcome)
            }
            Ok(Err(e)) => {
                error!("Remediation {} failed: {}", strategy.name(), e);
                None
            }
            Err(_) => {
                error!("Remediation {} panicked", strategy.name());
                None
            }
        }
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("kinds", &self.kinds())
            .finish()
    }
}
