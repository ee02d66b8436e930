pub mod gene;
pub mod mutate;
pub mod node;

pub use gene::{Gene, InnoGen};
pub use node::{Node, NodeId, NodeKind};

use crate::{
    error::{Error, Result},
    random::ProbBinding,
    Params,
};
use rand::{Rng, RngCore};
use std::collections::BTreeMap;

/// One candidate network. Nodes live in an arena addressed by [NodeId], and are evaluated in the
/// sequence held by `order`, where every gene's source precedes its destination. Genes are keyed
/// by innovation id, so iterating them is always innovation-ascending.
///
/// The arena always starts with the bias, then every sensory node, then every action node.
/// Internal nodes are appended as they are created. In `order`, the bias and sensory nodes lead
/// and the action nodes close.
#[derive(Debug, Clone)]
pub struct Genome {
    sensory: usize,
    action: usize,
    nodes: Vec<Node>,
    order: Vec<NodeId>,
    genes: BTreeMap<u64, Gene>,
    fitness: f64,
    adjusted_fitness: f64,
    specie: Option<usize>,
}

impl Genome {
    /// A minimal genome, where every action node is connected from the bias and from every
    /// sensory node with a random weight
    pub fn new<R: RngCore>(
        sensory: usize,
        action: usize,
        rng: &mut ProbBinding<Params, R>,
        inno: &InnoGen,
    ) -> Self {
        let (min, max) = (rng.params().weight_min, rng.params().weight_max);
        let mut genome = Self::with_layout(sensory, 0, action);
        for to in genome.action_ids() {
            for from in (0..=sensory).map(NodeId) {
                let weight = rng.random_range(min..=max);
                genome.push_gene(Gene::new(inno.next(), from, to, weight, true));
            }
        }
        genome
    }

    /// A genome with the given node counts and no genes
    pub(crate) fn with_layout(sensory: usize, internal: usize, action: usize) -> Self {
        let mut nodes = Vec::with_capacity(1 + sensory + action + internal);
        nodes.push(Node::new(NodeKind::Bias));
        nodes.extend((0..sensory).map(|_| Node::new(NodeKind::Sensory)));
        nodes.extend((0..action).map(|_| Node::new(NodeKind::Action)));
        nodes.extend((0..internal).map(|_| Node::new(NodeKind::Internal)));

        let internal_start = 1 + sensory + action;
        let order = (0..=sensory)
            .chain(internal_start..internal_start + internal)
            .chain(1 + sensory..internal_start)
            .map(NodeId)
            .collect();

        Self {
            sensory,
            action,
            nodes,
            order,
            genes: BTreeMap::new(),
            fitness: 0.,
            adjusted_fitness: 0.,
            specie: None,
        }
    }

    /// Same nodes in the same order, without genes, evaluation state or fitness
    pub(crate) fn skeleton(&self) -> Self {
        Self {
            sensory: self.sensory,
            action: self.action,
            nodes: self.nodes.iter().map(|n| Node::new(n.kind())).collect(),
            order: self.order.clone(),
            genes: BTreeMap::new(),
            fitness: 0.,
            adjusted_fitness: 0.,
            specie: None,
        }
    }

    /// A copy of this genome to be carried into the next generation. Its fitness is kept, as the
    /// copy behaves the same until mutated.
    pub fn offspring(&self) -> Self {
        Self {
            specie: None,
            ..self.clone()
        }
    }

    #[inline]
    pub fn sensory(&self) -> usize {
        self.sensory
    }

    #[inline]
    pub fn action(&self) -> usize {
        self.action
    }

    #[inline]
    pub fn internal(&self) -> usize {
        self.nodes.len() - 1 - self.sensory - self.action
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node handles in execution order
    #[inline]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    #[inline]
    pub fn genes(&self) -> &BTreeMap<u64, Gene> {
        &self.genes
    }

    #[inline]
    pub fn gene(&self, inno: u64) -> Option<&Gene> {
        self.genes.get(&inno)
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Execution position of every node, indexed by [NodeId]
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.nodes.len()];
        for (pos, id) in self.order.iter().enumerate() {
            positions[id.0] = pos;
        }
        positions
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Set the raw fitness. The adjusted fitness follows it until the genome's specie shares it.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
        self.adjusted_fitness = fitness;
    }

    #[inline]
    pub fn adjusted_fitness(&self) -> f64 {
        self.adjusted_fitness
    }

    pub(crate) fn set_adjusted_fitness(&mut self, fitness: f64) {
        self.adjusted_fitness = fitness;
    }

    /// Index of the specie this genome was grouped into this generation
    #[inline]
    pub fn specie(&self) -> Option<usize> {
        self.specie
    }

    pub(crate) fn set_specie(&mut self, specie: Option<usize>) {
        self.specie = specie;
    }

    fn action_ids(&self) -> impl Iterator<Item = NodeId> {
        (1 + self.sensory..1 + self.sensory + self.action).map(NodeId)
    }

    /// Insert a gene with an already assigned innovation id
    pub(crate) fn push_gene(&mut self, gene: Gene) {
        self.nodes[gene.to.0].add_inbound(gene.inno);
        self.genes.insert(gene.inno, gene);
    }

    /// Connect `from` to `to`. An existing gene on the same path is reused, otherwise a new one
    /// is created. Returns the innovation id of the gene.
    pub(crate) fn link(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        enabled: bool,
        inno: &InnoGen,
    ) -> u64 {
        if let Some(gene) = self.genes.values_mut().find(|g| g.path() == (from, to)) {
            gene.weight = weight;
            gene.enabled = enabled;
            return gene.inno;
        }

        let id = inno.next();
        self.push_gene(Gene::new(id, from, to, weight, enabled));
        id
    }

    /// Feed `inputs` forward through the network and return the action nodes' outputs
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.sensory {
            return Err(Error::ArityMismatch {
                expected: self.sensory,
                actual: inputs.len(),
            });
        }

        if self.action == 0 {
            return Ok(vec![]);
        }

        self.nodes[NodeId::BIAS.0].set_input(1.);
        for (idx, v) in inputs.iter().enumerate() {
            self.nodes[1 + idx].set_input(*v);
        }

        for pos in 0..self.order.len() {
            let id = self.order[pos].0;
            let (input, output) = self.nodes[id].evaluate(&self.nodes, &self.genes);
            self.nodes[id].set_state(input, output);
        }

        Ok(self.order[self.order.len() - self.action..]
            .iter()
            .map(|id| self.nodes[id.0].output())
            .collect())
    }
}
