//! Structural and weight mutations. Every mutation keeps the execution order valid: the source of
//! any gene, enabled or not, precedes its destination.

use super::{Gene, Genome, InnoGen, Node, NodeId, NodeKind};
use crate::{
    random::{EvolutionEvent, Happens, ProbBinding},
    Params,
};
use fxhash::{FxHashMap, FxHashSet};
use rand::{
    seq::{IndexedRandom, IteratorRandom},
    Rng, RngCore,
};
use rand_distr::{Distribution, Normal};
use tracing::trace;

impl Genome {
    /// Roll for, and apply, each kind of mutation once
    pub fn mutate<R: RngCore>(&mut self, rng: &mut ProbBinding<Params, R>, inno: &InnoGen) {
        if rng.happens(EvolutionEvent::MutateWeight) {
            self.mutate_weights(rng);
        }

        if rng.happens(EvolutionEvent::NewConnection) {
            self.mutate_connection(rng, inno);
        }

        if rng.happens(EvolutionEvent::NewNode) {
            self.mutate_node(rng, inno);
        }
    }

    /// Replace or perturb the weight of every gene
    pub fn mutate_weights<R: RngCore>(&mut self, rng: &mut ProbBinding<Params, R>) {
        let Params {
            weight_min: min,
            weight_max: max,
            perturb_scale,
            ..
        } = *rng.params();
        let perturb = Normal::new(0., perturb_scale).ok();

        for gene in self.genes.values_mut() {
            if rng.happens(EvolutionEvent::ReplaceWeight) {
                gene.weight = rng.random_range(min..=max);
            } else if let Some(normal) = &perturb {
                gene.weight = (gene.weight + normal.sample(rng)).clamp(min, max);
            }
        }
    }

    /// Connect a random internal or action node from a random node that it does not already
    /// receive from, and that does not depend on it. Returns the innovation id of the new gene,
    /// or None if the chosen destination has no such source.
    pub fn mutate_connection<R: RngCore>(
        &mut self,
        rng: &mut ProbBinding<Params, R>,
        inno: &InnoGen,
    ) -> Option<u64> {
        let to = self
            .order
            .iter()
            .copied()
            .filter(|id| matches!(self.node(*id).kind(), NodeKind::Internal | NodeKind::Action))
            .choose(rng)?;

        let Some(from) = self.open_sources(to).choose(rng).copied() else {
            trace!(to = to.0, "no open source");
            return None;
        };

        let positions = self.positions();
        if positions[from.0] > positions[to.0] {
            self.lift(to, from);
        }

        let weight = {
            let p = rng.params();
            let (min, max) = (p.weight_min, p.weight_max);
            rng.random_range(min..=max)
        };
        let id = self.link(from, to, weight, true, inno);
        trace!(from = from.0, to = to.0, inno = id, "new connection");
        Some(id)
    }

    /// Split a random enabled gene that is not driven by the bias. Returns the id of the new node.
    pub fn mutate_node<R: RngCore>(
        &mut self,
        rng: &mut ProbBinding<Params, R>,
        inno: &InnoGen,
    ) -> Option<NodeId> {
        let target = self
            .genes
            .values()
            .filter(|g| g.is_splittable())
            .map(|g| g.inno)
            .collect::<Vec<_>>()
            .choose(rng)
            .copied()?;

        self.split(target, inno)
    }

    /// Disable the gene `target` and route it through a new internal node instead. The new node
    /// receives the bias with weight 0 and the old source with weight 1, and passes to the old
    /// destination with the old weight.
    pub(crate) fn split(&mut self, target: u64, inno: &InnoGen) -> Option<NodeId> {
        let gene = self.genes.get_mut(&target)?;
        gene.enabled = false;
        let (from, to, weight) = (gene.from, gene.to, gene.weight);

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(NodeKind::Internal));
        let at = match self.node(to).kind() {
            NodeKind::Action => self.order.len() - self.action,
            _ => self.position(to)?,
        };
        self.order.insert(at, id);

        self.push_gene(Gene::new(inno.next(), NodeId::BIAS, id, 0., true));
        self.push_gene(Gene::new(inno.next(), from, id, 1., true));
        self.push_gene(Gene::new(inno.next(), id, to, weight, true));
        trace!(inno = target, node = id.0, "split gene");
        Some(id)
    }

    /// Every node that may be connected into `to` without creating a cycle or a duplicate
    /// enabled path
    pub fn open_sources(&self, to: NodeId) -> Vec<NodeId> {
        let feeding = self
            .node(to)
            .inbound()
            .iter()
            .filter_map(|inno| self.genes.get(inno))
            .filter(|g| g.enabled)
            .map(|g| g.from)
            .collect::<FxHashSet<_>>();
        let downstream = self.reachable_from(to);

        self.order
            .iter()
            .copied()
            .filter(|id| {
                *id != to
                    && self.node(*id).kind() != NodeKind::Action
                    && !feeding.contains(id)
                    && !downstream.contains(id)
            })
            .collect()
    }

    /// Whether `node` can be reached by following genes, enabled or not, out of `from`
    pub fn depends_on(&self, node: NodeId, from: NodeId) -> bool {
        node == from || self.reachable_from(from).contains(&node)
    }

    fn outgoing(&self) -> FxHashMap<NodeId, Vec<NodeId>> {
        let mut outgoing: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        for gene in self.genes.values() {
            outgoing.entry(gene.from).or_default().push(gene.to);
        }
        outgoing
    }

    fn reachable_from(&self, from: NodeId) -> FxHashSet<NodeId> {
        let outgoing = self.outgoing();
        let mut visited = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            for next in outgoing.get(&id).into_iter().flatten() {
                if visited.insert(*next) {
                    stack.push(*next);
                }
            }
        }
        visited
    }

    /// Move `to`, along with everything in the order between it and `from` that depends on it,
    /// to directly after `from`. Relative order within both groups is kept.
    fn lift(&mut self, to: NodeId, from: NodeId) {
        let positions = self.positions();
        let (start, end) = (positions[to.0], positions[from.0]);
        debug_assert!(start < end);

        let mut moved = FxHashSet::default();
        moved.insert(to);
        for id in &self.order[start + 1..=end] {
            let fed = self
                .node(*id)
                .inbound()
                .iter()
                .filter_map(|inno| self.genes.get(inno))
                .any(|g| moved.contains(&g.from));
            if fed {
                moved.insert(*id);
            }
        }
        debug_assert!(!moved.contains(&from));

        let (stay, lifted): (Vec<NodeId>, Vec<NodeId>) = self.order[start..=end]
            .iter()
            .copied()
            .partition(|id| !moved.contains(id));
        self.order.splice(start..=end, stay.into_iter().chain(lifted));
        trace!(node = to.0, after = from.0, "lifted in order");
    }

    /// Whether every gene points forward in the execution order
    pub fn is_ordered(&self) -> bool {
        let positions = self.positions();
        self.genes
            .values()
            .all(|g| positions[g.from.0] < positions[g.to.0])
    }
}
