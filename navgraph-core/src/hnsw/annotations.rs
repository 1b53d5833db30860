//! Optional per-edge annotations consumed by experimental traversal policies.
//!
//! Annotations live beside the graph rather than inside [`crate::Edge`], so
//! the adjacency layout and the base traversal stay untouched when no policy
//! uses them.

use std::collections::HashMap;

const DEFAULT_WEIGHT: i32 = 50;
const DEFAULT_KEEP_PROBABILITY: f32 = 0.5;

/// Mutable statistics attached to one directed edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeAnnotation {
    /// Training weight adjusted by pruning policies.
    pub weight: i32,
    /// Probability that a sampling traversal keeps the edge.
    pub keep_probability: f32,
    /// Number of times a policy updated this annotation.
    pub updates: u32,
    /// Penalty accumulated when the edge leads to poor candidates.
    pub stinky: f32,
    /// Evaluations spent following the edge.
    pub cost: i32,
    /// Result-set improvements credited to the edge.
    pub benefit: i32,
    /// Edges marked ignored are skipped by annotated searches.
    pub ignored: bool,
}

impl Default for EdgeAnnotation {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            keep_probability: DEFAULT_KEEP_PROBABILITY,
            updates: 0,
            stinky: 0.0,
            cost: 0,
            benefit: 0,
            ignored: false,
        }
    }
}

/// Side table of [`EdgeAnnotation`]s keyed by `(node, layer, target)`.
///
/// # Examples
/// ```
/// use navgraph_core::EdgeAnnotations;
///
/// let mut annotations = EdgeAnnotations::new();
/// annotations.ignore(3, 0, 7);
/// assert!(annotations.is_ignored(3, 0, 7));
/// assert!(!annotations.is_ignored(7, 0, 3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct EdgeAnnotations {
    entries: HashMap<(usize, usize, usize), EdgeAnnotation>,
}

impl EdgeAnnotations {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the annotation for the edge `node -> target` at `layer`.
    #[must_use]
    pub fn get(&self, node: usize, layer: usize, target: usize) -> Option<&EdgeAnnotation> {
        self.entries.get(&(node, layer, target))
    }

    /// Returns the annotation for the edge, inserting defaults when absent,
    /// and bumps its update counter.
    pub fn update(&mut self, node: usize, layer: usize, target: usize) -> &mut EdgeAnnotation {
        let entry = self.entries.entry((node, layer, target)).or_default();
        entry.updates = entry.updates.saturating_add(1);
        entry
    }

    /// Marks the edge as ignored.
    pub fn ignore(&mut self, node: usize, layer: usize, target: usize) {
        self.update(node, layer, target).ignored = true;
    }

    /// Returns whether the edge is marked ignored.
    #[must_use]
    pub fn is_ignored(&self, node: usize, layer: usize, target: usize) -> bool {
        self.get(node, layer, target)
            .is_some_and(|annotation| annotation.ignored)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_inserts_defaults_and_counts() {
        let mut annotations = EdgeAnnotations::new();
        annotations.update(1, 2, 3).weight += 5;
        annotations.update(1, 2, 3);
        let stored = annotations.get(1, 2, 3).copied().expect("annotation exists");
        assert_eq!(stored.weight, 55);
        assert_eq!(stored.updates, 2);
        assert_eq!((stored.cost, stored.benefit), (0, 0));
        assert!((stored.keep_probability - 0.5).abs() < f32::EPSILON);
        assert_eq!(annotations.len(), 1);
    }

    #[test]
    fn annotations_are_directional_and_layer_scoped() {
        let mut annotations = EdgeAnnotations::new();
        annotations.ignore(0, 1, 4);
        assert!(annotations.is_ignored(0, 1, 4));
        assert!(!annotations.is_ignored(0, 0, 4));
        assert!(!annotations.is_ignored(4, 1, 0));
    }
}
