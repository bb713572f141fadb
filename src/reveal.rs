use std::collections::HashSet;

use super::*;

/// Knobs forwarded to the viewport intersection signal source.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOptions {
    /// Fraction of the element that must intersect the viewport before it is
    /// revealed.
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px".to_string(),
        }
    }
}

/// Tracks elements waiting for their first moment of visibility. Revealing
/// is monotonic: an element leaves the observed set the moment it qualifies
/// and can never return.
#[derive(Debug)]
pub(crate) struct RevealController {
    options: RevealOptions,
    observed: Vec<NodeId>,
    revealed: HashSet<NodeId>,
}

impl RevealController {
    pub(crate) fn new(options: RevealOptions) -> Self {
        Self {
            options,
            observed: Vec::new(),
            revealed: HashSet::new(),
        }
    }

    pub(crate) fn set_options(&mut self, options: RevealOptions) {
        self.options = options;
    }

    pub(crate) fn options(&self) -> &RevealOptions {
        &self.options
    }

    pub(crate) fn observe(&mut self, node: NodeId) {
        if !self.observed.contains(&node) && !self.revealed.contains(&node) {
            self.observed.push(node);
        }
    }

    /// Reacts to one intersection entry. Returns `true` when the element
    /// crossed the threshold for the first time; the caller schedules the
    /// marker class on the next frame. The subscription is released here, so
    /// later entries for the same element are ignored.
    pub(crate) fn on_intersection(&mut self, node: NodeId, ratio: f64) -> bool {
        if ratio < self.options.threshold {
            return false;
        }
        let Some(position) = self.observed.iter().position(|n| *n == node) else {
            return false;
        };
        self.observed.remove(position);
        self.revealed.insert(node);
        true
    }

    pub(crate) fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub(crate) fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    pub(crate) fn is_revealed(&self, node: NodeId) -> bool {
        self.revealed.contains(&node)
    }
}
