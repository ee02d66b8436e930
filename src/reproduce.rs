//! Producing a specie's share of the next generation.

use crate::{
    crossover::crossover,
    genome::{Genome, InnoGen},
    random::{weighted_random_select, EvolutionEvent, Happens, ProbBinding},
    Params, Specie,
};
use rand::RngCore;
use tracing::trace;

/// Members sorted by descending raw fitness, truncated to the fraction allowed to reproduce.
/// Never empty unless `members` is.
fn parents<'a>(
    genomes: &'a [Genome],
    members: &[usize],
    survival_fraction: f64,
) -> Vec<&'a Genome> {
    let mut parents = members
        .iter()
        .filter_map(|idx| genomes.get(*idx))
        .collect::<Vec<_>>();
    parents.sort_by(|l, r| r.fitness().total_cmp(&l.fitness()));

    let keep = (parents.len() as f64 * survival_fraction).ceil() as usize;
    parents.truncate(keep.clamp(1, parents.len().max(1)));
    parents
}

impl Specie {
    /// Fill the offspring buffer with `next_size` genomes: an unchanged copy of the fittest
    /// member, then mutated copies and crossovers of the fittest members, picked by roulette.
    /// Replaces offspring that were never collected.
    pub fn generate_offsprings<R: RngCore>(
        &mut self,
        genomes: &[Genome],
        rng: &mut ProbBinding<Params, R>,
        inno: &InnoGen,
    ) {
        self.offspring.clear();
        let size = self.next_size();
        if size == 0 || self.is_empty() {
            return;
        }

        let parents = parents(genomes, self.members(), rng.params().survival_fraction);
        let Some(champion) = parents.first() else {
            return;
        };

        let mut offspring = Vec::with_capacity(size);
        offspring.push(champion.offspring());
        while offspring.len() < size {
            let mut child = if rng.happens(EvolutionEvent::SingleParent) {
                let Some(parent) = weighted_random_select(&parents, |g| g.fitness(), rng) else {
                    break;
                };
                let mut child = parent.offspring();
                child.set_fitness(0.);
                child
            } else {
                let l = weighted_random_select(&parents, |g| g.fitness(), rng);
                let r = weighted_random_select(&parents, |g| g.fitness(), rng);
                let (Some(l), Some(r)) = (l, r) else {
                    break;
                };
                crossover(l, r, rng)
            };

            child.mutate(rng, inno);
            offspring.push(child);
        }

        trace!(
            parents = parents.len(),
            offspring = offspring.len(),
            "generated offspring"
        );
        self.offspring = offspring;
    }
}
