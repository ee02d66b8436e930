//! A population of genomes, grouped into species and trained generation by generation.

use crate::{
    error::Result,
    genome::{Genome, InnoGen},
    random::{default_rng, ProbBinding, WyRng},
    scenario::{Callbacks, Stats},
    Params, Specie,
};
use core::{mem, ops::ControlFlow};
use rand::RngCore;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The genome with the highest raw fitness, the first one on a tie
pub(crate) fn fittest(genomes: &[Genome]) -> Option<&Genome> {
    genomes
        .iter()
        .reduce(|best, g| if g.fitness() > best.fitness() { g } else { best })
}

pub struct Population<R: RngCore = WyRng> {
    genomes: Vec<Genome>,
    species: Vec<Specie>,
    rng: ProbBinding<Params, R>,
    inno: InnoGen,
    generation: usize,
}

impl Population<WyRng> {
    /// A population of `size` minimal genomes, seeded from the system and sharing the
    /// process-wide innovation counter
    pub fn new(size: usize, sensory: usize, action: usize, params: Params) -> Result<Self> {
        Self::with_rng(size, sensory, action, params, default_rng()?, InnoGen::global())
    }
}

impl<R: RngCore> Population<R> {
    pub fn with_rng(
        size: usize,
        sensory: usize,
        action: usize,
        params: Params,
        rng: R,
        inno: InnoGen,
    ) -> Result<Self> {
        params.validate()?;
        let mut rng = ProbBinding::new(params, rng);
        let muse = Genome::new(sensory, action, &mut rng, &inno);
        Ok(Self::seeded(&muse, size, rng, inno))
    }

    /// A population of `size` variations on `muse`, such as a champion loaded from file
    pub fn from_genome(
        muse: &Genome,
        size: usize,
        params: Params,
        rng: R,
        inno: InnoGen,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self::seeded(muse, size, ProbBinding::new(params, rng), inno))
    }

    fn seeded(
        muse: &Genome,
        size: usize,
        mut rng: ProbBinding<Params, R>,
        inno: InnoGen,
    ) -> Self {
        let genomes = (0..size)
            .map(|_| {
                let mut genome = muse.offspring();
                genome.set_fitness(0.);
                genome.mutate(&mut rng, &inno);
                genome
            })
            .collect();

        let mut population = Self {
            genomes,
            species: vec![],
            rng,
            inno,
            generation: 0,
        };
        population.group_species();
        population
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[inline]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[inline]
    pub fn genomes_mut(&mut self) -> &mut [Genome] {
        &mut self.genomes
    }

    #[inline]
    pub fn genome(&self, idx: usize) -> Option<&Genome> {
        self.genomes.get(idx)
    }

    #[inline]
    pub fn genome_mut(&mut self, idx: usize) -> Option<&mut Genome> {
        self.genomes.get_mut(idx)
    }

    #[inline]
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    /// Number of generations trained so far
    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[inline]
    pub fn params(&self) -> &Params {
        self.rng.params()
    }

    #[inline]
    pub fn inno(&self) -> &InnoGen {
        &self.inno
    }

    pub fn best_genome(&self) -> Option<&Genome> {
        fittest(&self.genomes)
    }

    fn average_adjusted_fitness(&self) -> f64 {
        if self.genomes.is_empty() {
            return 0.;
        }
        self.genomes
            .iter()
            .map(Genome::adjusted_fitness)
            .sum::<f64>()
            / self.genomes.len() as f64
    }

    /// Sort every genome into the first specie it's compatible with, founding a new specie when
    /// there is none. Species that go without members are dropped.
    pub fn group_species(&mut self) {
        self.species.retain(|s| !s.is_extinct());
        for specie in self.species.iter_mut() {
            specie.clear_members();
        }

        for idx in 0..self.genomes.len() {
            let found = self
                .species
                .iter()
                .position(|s| s.belongs_to(&self.genomes, &self.genomes[idx], &mut self.rng));
            match found {
                Some(s) => self.species[s].add_member(idx),
                None => {
                    let mut specie = Specie::new();
                    specie.add_member(idx);
                    self.species.push(specie);
                }
            }
        }

        self.species.retain(|s| !s.is_empty());
        for genome in self.genomes.iter_mut() {
            genome.set_specie(None);
        }
        for (s_idx, specie) in self.species.iter().enumerate() {
            for idx in specie.members() {
                self.genomes[*idx].set_specie(Some(s_idx));
            }
        }
    }

    fn share_fitness(&mut self) {
        for specie in self.species.iter() {
            specie.share_fitness(&mut self.genomes, self.rng.params());
        }
    }

    /// Work out every specie's offspring count. Adjusted fitness is measured from the lowest
    /// negative one, and the counts never add up to more than the population. If every specie
    /// comes up empty, the specie of the fittest genome gets the whole population.
    fn allocate(&mut self) {
        let floor = self
            .genomes
            .iter()
            .map(Genome::adjusted_fitness)
            .filter(|f| f.is_finite())
            .fold(0., f64::min);
        let avg_adjusted = self.average_adjusted_fitness() - floor;
        for specie in self.species.iter_mut() {
            specie.compute_next_size(&self.genomes, avg_adjusted, floor, self.rng.params());
        }

        let cap = self.genomes.len();
        let mut total = self.species.iter().map(Specie::next_size).sum::<usize>();
        while total > cap {
            let Some(largest) = self.species.iter_mut().max_by_key(|s| s.next_size()) else {
                break;
            };
            let size = largest.next_size();
            largest.set_next_size(size - 1);
            total -= 1;
        }

        if self.species.iter().all(|s| s.next_size() == 0) {
            if let Some(s_idx) = fittest(&self.genomes).and_then(Genome::specie) {
                warn!(
                    generation = self.generation,
                    "no specie earned offspring, repopulating from the fittest"
                );
                self.species[s_idx].set_next_size(self.genomes.len());
            }
        }
    }

    fn reproduce(&mut self) {
        let mut forks = (0..self.species.len())
            .map(|_| self.rng.fork())
            .collect::<Vec<_>>();
        let genomes = &self.genomes;
        let inno = &self.inno;

        #[cfg(feature = "parallel")]
        self.species
            .par_iter_mut()
            .zip(forks.par_iter_mut())
            .for_each(|(specie, rng)| specie.generate_offsprings(genomes, rng, inno));

        #[cfg(not(feature = "parallel"))]
        self.species
            .iter_mut()
            .zip(forks.iter_mut())
            .for_each(|(specie, rng)| specie.generate_offsprings(genomes, rng, inno));
    }

    /// Group, evaluate, and replace the current generation with its offspring
    pub fn train_one_generation(&mut self, callbacks: &mut impl Callbacks) -> ControlFlow<()> {
        self.group_species();
        callbacks.on_generation_start(&mut Stats {
            generation: self.generation,
            species: &self.species,
            genomes: &self.genomes,
        });

        callbacks.evaluate_genomes(&mut self.genomes);
        self.share_fitness();
        self.allocate();
        self.share_fitness();

        debug!(
            generation = self.generation,
            population = self.genomes.len(),
            species = self.species.len(),
            best_fitness = self.best_genome().map_or(f64::NAN, Genome::fitness),
            avg_adjusted = self.average_adjusted_fitness(),
            "evaluated generation"
        );

        self.reproduce();
        let mut next = Vec::with_capacity(self.genomes.len());
        for specie in self.species.iter_mut() {
            specie.retain_representative(&self.genomes, &mut self.rng);
            specie.collect_offsprings(&mut next);
        }

        let evaluated = mem::replace(&mut self.genomes, next);
        let generation = self.generation;
        self.generation += 1;

        callbacks.on_generation_end(&mut Stats {
            generation,
            species: &self.species,
            genomes: &evaluated,
        })
    }

    /// Train until `max_generations` pass, the best genome is fitter than `threshold`, or the
    /// callbacks break. Returns the number of generations trained.
    pub fn train_generations(
        &mut self,
        callbacks: &mut impl Callbacks,
        max_generations: usize,
        threshold: f64,
    ) -> usize {
        for generation in 0..max_generations {
            let flow = self.train_one_generation(callbacks);
            if flow.is_break() || self.best_genome().is_some_and(|g| g.fitness() > threshold) {
                return generation + 1;
            }
        }
        max_generations
    }
}
