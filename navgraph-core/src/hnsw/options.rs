//! Per-query options and the outcome returned by a search.

use std::fmt;

use crate::distance::DistanceTally;

use super::{
    annotations::EdgeAnnotations, observe::TraversalObserver, types::EdgeHandle, types::Neighbour,
};

/// Early-termination policy applied to the layer-0 traversal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Termination {
    /// Run until the frontier cannot improve the result.
    #[default]
    Exhaustive,
    /// Stop once this many layer-0 distance evaluations were spent.
    CalculationBudget(u64),
}

/// Optional traversal modifiers for a single query.
///
/// The defaults reproduce the plain search exactly.
///
/// # Examples
/// ```
/// use navgraph_core::{SearchOptions, Termination};
///
/// let options = SearchOptions::new()
///     .with_ef_search(64)
///     .with_termination(Termination::CalculationBudget(500))
///     .with_path_recording();
/// assert_eq!(options.ef_search(), Some(64));
/// ```
#[derive(Default)]
pub struct SearchOptions<'a> {
    ef_search: Option<usize>,
    termination: Termination,
    annotations: Option<&'a EdgeAnnotations>,
    record_path: bool,
    observer: Option<&'a mut dyn TraversalObserver>,
}

impl<'a> SearchOptions<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the index's layer-0 beam width for this query.
    #[must_use]
    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = Some(ef_search);
        self
    }

    #[must_use]
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Skips edges the table marks as ignored.
    #[must_use]
    pub fn with_annotations(mut self, annotations: &'a EdgeAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Records the handle of every edge admitted at layer 0.
    #[must_use]
    pub fn with_path_recording(mut self) -> Self {
        self.record_path = true;
        self
    }

    /// Streams per-iteration traversal snapshots into `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: &'a mut dyn TraversalObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    #[rustfmt::skip]
    pub fn ef_search(&self) -> Option<usize> { self.ef_search }

    #[must_use]
    #[rustfmt::skip]
    pub fn termination(&self) -> Termination { self.termination }

    pub(crate) fn into_hooks(self) -> (Option<usize>, TraversalHooks<'a>) {
        let budget = match self.termination {
            Termination::Exhaustive => None,
            Termination::CalculationBudget(limit) => Some(limit),
        };
        (
            self.ef_search,
            TraversalHooks {
                annotations: self.annotations,
                budget,
                path: self.record_path.then(Vec::new),
                observer: self.observer,
            },
        )
    }
}

impl fmt::Debug for SearchOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("ef_search", &self.ef_search)
            .field("termination", &self.termination)
            .field("annotations", &self.annotations.map(EdgeAnnotations::len))
            .field("record_path", &self.record_path)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Hooks threaded through a traversal. Budget and path recording apply to
/// layer 0 only.
#[derive(Default)]
pub(crate) struct TraversalHooks<'a> {
    pub(crate) annotations: Option<&'a EdgeAnnotations>,
    pub(crate) budget: Option<u64>,
    pub(crate) path: Option<Vec<EdgeHandle>>,
    pub(crate) observer: Option<&'a mut dyn TraversalObserver>,
}

impl TraversalHooks<'_> {
    pub(crate) fn inert() -> Self {
        Self::default()
    }

    pub(crate) fn skips(&self, node: usize, layer: usize, target: usize) -> bool {
        self.annotations
            .is_some_and(|annotations| annotations.is_ignored(node, layer, target))
    }

    pub(crate) fn budget_spent(&self, layer: usize, tally: &DistanceTally) -> bool {
        layer == 0 && self.budget.is_some_and(|limit| tally.layer0() >= limit)
    }

    pub(crate) fn record(&mut self, handle: EdgeHandle) {
        if handle.layer != 0 {
            return;
        }
        if let Some(path) = self.path.as_mut() {
            path.push(handle);
        }
    }

    pub(crate) fn observing(&self) -> bool {
        self.observer.is_some()
    }
}

/// Result of a query: the neighbours, the distance evaluations spent, and
/// the recorded layer-0 path when requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Up to `k` neighbours, nearest first.
    pub neighbours: Vec<Neighbour>,
    /// Distance evaluations performed by this query.
    pub tally: DistanceTally,
    /// Handles of edges admitted during the layer-0 traversal, in discovery
    /// order. Empty unless path recording was requested.
    pub path: Vec<EdgeHandle>,
}
