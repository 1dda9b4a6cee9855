use thiserror::Error;

use crate::timing::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle { node: usize },
    Transitioning { from: usize, to: usize, is_reset: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShowRejected {
    #[error("a transition is already in progress")]
    Transitioning,
    #[error("node {target} is outside 0..{node_count}")]
    OutOfRange { target: isize, node_count: usize },
    #[error("node {0} is already showing")]
    SameNode(usize),
}

/// An accepted node swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub is_reset: bool,
}

impl Transition {
    /// Forward travel exits the outgoing node upward.
    pub fn exits_upward(&self) -> bool {
        self.to > self.from
    }
}

/// Which node is in view and whether a swap is under way. Only the
/// transition routine and the reset routine move it.
#[derive(Debug, Clone)]
pub struct NodeMachine {
    state: NodeState,
    node_count: usize,
    changed_at_ms: Millis,
    previous: Option<usize>,
}

impl NodeMachine {
    pub fn new(node_count: usize) -> Self {
        Self {
            state: NodeState::Idle { node: 0 },
            node_count,
            changed_at_ms: 0,
            previous: None,
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The node in view. During a swap this is still the outgoing node.
    pub fn current(&self) -> usize {
        match self.state {
            NodeState::Idle { node } => node,
            NodeState::Transitioning { from, .. } => from,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, NodeState::Transitioning { .. })
    }

    /// When the last swap started or finished.
    pub fn changed_at_ms(&self) -> Millis {
        self.changed_at_ms
    }

    /// Node shown before the last completed swap, if there was one.
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    pub fn request_show(
        &mut self,
        target: isize,
        is_reset: bool,
        now: Millis,
    ) -> Result<Transition, ShowRejected> {
        let from = match self.state {
            NodeState::Transitioning { .. } => return Err(ShowRejected::Transitioning),
            NodeState::Idle { node } => node,
        };
        if target < 0 || target >= self.node_count as isize {
            return Err(ShowRejected::OutOfRange {
                target,
                node_count: self.node_count,
            });
        }
        let to = target as usize;
        if to == from {
            return Err(ShowRejected::SameNode(to));
        }

        self.state = NodeState::Transitioning { from, to, is_reset };
        self.changed_at_ms = now;
        Ok(Transition { from, to, is_reset })
    }

    /// Lands a pending swap. Returns the node now in view.
    pub fn complete(&mut self, now: Millis) -> Option<usize> {
        match self.state {
            NodeState::Transitioning { from, to, .. } => {
                self.state = NodeState::Idle { node: to };
                self.previous = Some(from);
                self.changed_at_ms = now;
                Some(to)
            }
            NodeState::Idle { .. } => None,
        }
    }

    pub fn reset(&mut self, now: Millis) {
        self.state = NodeState::Idle { node: 0 };
        self.changed_at_ms = now;
        self.previous = None;
    }
}
