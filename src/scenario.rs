use crate::{
    error::Result,
    genome::Genome,
    population::{fittest, Population},
    Params, Specie,
};
use core::ops::ControlFlow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What a [Population] calls out to while training
pub trait Callbacks {
    fn on_generation_start(&mut self, _stats: &mut Stats<'_>) {}

    /// Assign a raw fitness to every genome
    fn evaluate_genomes(&mut self, genomes: &mut [Genome]);

    /// Called once the next generation replaced the one described by `stats`. Breaking stops
    /// training.
    fn on_generation_end(&mut self, _stats: &mut Stats<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// A task that genomes are evolved to solve
pub trait Scenario: Sync {
    /// sensory and action node counts
    fn io(&self) -> (usize, usize);
    fn eval(&self, genome: &mut Genome) -> f64;
}

/// A view of one generation
pub struct Stats<'a> {
    pub generation: usize,
    pub species: &'a [Specie],
    pub genomes: &'a [Genome],
}

impl<'a> Stats<'a> {
    pub fn fittest(&self) -> Option<&'a Genome> {
        fittest(self.genomes)
    }

    pub fn any_fitter_than(&self, target: f64) -> bool {
        self.genomes.iter().any(|g| g.fitness() > target)
    }

    pub fn average_fitness(&self) -> f64 {
        if self.genomes.is_empty() {
            return 0.;
        }
        self.genomes.iter().map(Genome::fitness).sum::<f64>() / self.genomes.len() as f64
    }
}

pub type Hook = Box<dyn FnMut(&mut Stats<'_>) -> ControlFlow<()> + Send>;

#[derive(Default)]
pub struct EvolutionHooks {
    start: Vec<Hook>,
    end: Vec<Hook>,
}

impl EvolutionHooks {
    /// Hooks run at the end of every generation
    pub fn new(end: Vec<Hook>) -> Self {
        Self { start: vec![], end }
    }

    /// Add a hook run at the start of every generation. Start hooks can't stop training, a
    /// `Break` they return is ignored.
    pub fn with_start(mut self, hook: Hook) -> Self {
        self.start.push(hook);
        self
    }

    pub fn with_end(mut self, hook: Hook) -> Self {
        self.end.push(hook);
        self
    }
}

/// Adapts a [Scenario] and its hooks to the [Callbacks] a population trains with
pub struct Evolution<S: Scenario> {
    scenario: S,
    hooks: EvolutionHooks,
}

impl<S: Scenario> Evolution<S> {
    pub fn new(scenario: S, hooks: EvolutionHooks) -> Self {
        Self { scenario, hooks }
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }
}

impl<S: Scenario> Callbacks for Evolution<S> {
    fn on_generation_start(&mut self, stats: &mut Stats<'_>) {
        // only end hooks may stop training
        for hook in self.hooks.start.iter_mut() {
            let _ = hook(stats);
        }
    }

    fn evaluate_genomes(&mut self, genomes: &mut [Genome]) {
        let scenario = &self.scenario;

        #[cfg(feature = "parallel")]
        genomes.par_iter_mut().for_each(|genome| {
            let fitness = scenario.eval(genome);
            genome.set_fitness(fitness);
        });

        #[cfg(not(feature = "parallel"))]
        genomes.iter_mut().for_each(|genome| {
            let fitness = scenario.eval(genome);
            genome.set_fitness(fitness);
        });
    }

    fn on_generation_end(&mut self, stats: &mut Stats<'_>) -> ControlFlow<()> {
        let mut flow = ControlFlow::Continue(());
        for hook in self.hooks.end.iter_mut() {
            if hook(stats).is_break() {
                flow = ControlFlow::Break(());
            }
        }
        flow
    }
}

/// Evolve a population of `size` on `scenario`, until `max_generations` pass, some genome is
/// fitter than `threshold`, or a hook breaks
pub fn evolve<S: Scenario>(
    scenario: S,
    size: usize,
    params: Params,
    hooks: EvolutionHooks,
    max_generations: usize,
    threshold: f64,
) -> Result<Population> {
    let (sensory, action) = scenario.io();
    let mut population = Population::new(size, sensory, action, params)?;
    let mut evolution = Evolution::new(scenario, hooks);
    population.train_generations(&mut evolution, max_generations, threshold);
    Ok(population)
}
