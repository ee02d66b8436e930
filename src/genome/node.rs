use super::Gene;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Bias,
    Sensory,
    Internal,
    Action,
}

/// Stable handle of a node within its genome. Unlike a node's position in the execution order,
/// it never changes once allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const BIAS: NodeId = NodeId(0);
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    /// innovation ids of every gene whose destination is this node
    inbound: BTreeSet<u64>,
    input: f64,
    output: f64,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            inbound: BTreeSet::new(),
            input: 0.,
            output: 0.,
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn inbound(&self) -> &BTreeSet<u64> {
        &self.inbound
    }

    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    pub(crate) fn add_inbound(&mut self, inno: u64) {
        self.inbound.insert(inno);
    }

    pub(crate) fn set_input(&mut self, v: f64) {
        self.input = v;
    }

    pub(crate) fn set_state(&mut self, input: f64, output: f64) {
        self.input = input;
        self.output = output;
    }

    /// Compute this node's (input, output) from the outputs of `nodes`. Bias and sensory nodes
    /// pass their assigned input through, every other node takes tanh of its weighted inbound sum.
    pub fn evaluate(&self, nodes: &[Node], genes: &BTreeMap<u64, Gene>) -> (f64, f64) {
        match self.kind {
            NodeKind::Bias | NodeKind::Sensory => (self.input, self.input),
            NodeKind::Internal | NodeKind::Action => {
                let sum = self
                    .inbound
                    .iter()
                    .filter_map(|inno| genes.get(inno))
                    .filter(|gene| gene.enabled)
                    .map(|gene| nodes[gene.from.0].output * gene.weight)
                    .sum::<f64>();
                (sum, sum.tanh())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;

    #[test]
    fn test_evaluate_passthrough() {
        let mut sensory = Node::new(NodeKind::Sensory);
        sensory.set_input(0.25);
        assert_eq!(sensory.evaluate(&[], &BTreeMap::new()), (0.25, 0.25));
    }

    #[test]
    fn test_evaluate_weighted_tanh() {
        let mut bias = Node::new(NodeKind::Bias);
        bias.output = 1.;
        let mut sensory = Node::new(NodeKind::Sensory);
        sensory.output = 0.5;

        let mut action = Node::new(NodeKind::Action);
        let genes = BTreeMap::from([
            (0, Gene::new(0, NodeId(0), NodeId(2), 0.5, true)),
            (1, Gene::new(1, NodeId(1), NodeId(2), 2.0, true)),
            (2, Gene::new(2, NodeId(1), NodeId(2), 9.0, false)),
        ]);
        for inno in genes.keys() {
            action.add_inbound(*inno);
        }

        let nodes = [bias, sensory, Node::new(NodeKind::Action)];
        let (input, output) = action.evaluate(&nodes, &genes);
        assert_f64_approx!(input, 1.5);
        assert_f64_approx!(output, 1.5f64.tanh());
    }
}
