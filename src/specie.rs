use crate::{
    crossover::delta,
    genome::Genome,
    random::ProbBinding,
    Params,
};
use rand::{seq::IndexedRandom, RngCore};
use tracing::info;

/// A group of compatible genomes. Members are indices into the population's current genomes, and
/// are only meaningful for the generation they were grouped in.
#[derive(Debug, Clone)]
pub struct Specie {
    members: Vec<usize>,
    /// a member of the previous generation, to compare against while no current member has joined
    repr: Option<Genome>,
    pub(crate) offspring: Vec<Genome>,
    best_fitness: f64,
    stagnation: usize,
    next_size: usize,
    extinct: bool,
    age: usize,
}

impl Default for Specie {
    fn default() -> Self {
        Self {
            members: vec![],
            repr: None,
            offspring: vec![],
            best_fitness: f64::NEG_INFINITY,
            stagnation: 0,
            next_size: 0,
            extinct: false,
            age: 0,
        }
    }
}

impl Specie {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn age(&self) -> usize {
        self.age
    }

    /// Whether this specie has yet to reproduce
    #[inline]
    pub fn is_new(&self) -> bool {
        self.age == 0
    }

    #[inline]
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    #[inline]
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    #[inline]
    pub fn next_size(&self) -> usize {
        self.next_size
    }

    /// Whether stagnation has slated this specie for extinction
    #[inline]
    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    #[inline]
    pub fn offspring(&self) -> &[Genome] {
        &self.offspring
    }

    pub(crate) fn add_member(&mut self, idx: usize) {
        self.members.push(idx);
    }

    pub(crate) fn clear_members(&mut self) {
        self.members.clear();
    }

    pub(crate) fn set_next_size(&mut self, size: usize) {
        self.next_size = size;
        self.extinct = false;
    }

    /// Keep a random member around to compare the next generation against
    pub(crate) fn retain_representative(&mut self, genomes: &[Genome], rng: &mut impl RngCore) {
        if let Some(repr) = self.members.choose(rng).and_then(|idx| genomes.get(*idx)) {
            self.repr = Some(repr.clone());
        }
    }

    /// Whether `candidate` is close enough to a random member, or to the retained representative
    /// while there are no members yet. A specie with neither never accepts.
    pub fn belongs_to<R: RngCore>(
        &self,
        genomes: &[Genome],
        candidate: &Genome,
        rng: &mut ProbBinding<Params, R>,
    ) -> bool {
        let repr = match self.members.choose(rng) {
            Some(idx) => genomes.get(*idx),
            None => self.repr.as_ref(),
        };

        let Some(repr) = repr else {
            return false;
        };

        let params = rng.params();
        delta(repr, candidate, params).is_some_and(|d| d < params.specie_threshold)
    }

    /// Sum of the members' adjusted fitness
    pub fn fitness(&self, genomes: &[Genome]) -> f64 {
        self.members
            .iter()
            .filter_map(|idx| genomes.get(*idx))
            .map(Genome::adjusted_fitness)
            .sum()
    }

    /// Decide how many offspring this specie gets next generation. Adjusted fitness is measured
    /// from `floor`, and `avg_adjusted` is the population's average measured the same way. The
    /// count never exceeds the population size.
    pub fn compute_next_size(
        &mut self,
        genomes: &[Genome],
        avg_adjusted: f64,
        floor: f64,
        params: &Params,
    ) -> usize {
        self.stagnation += 1;
        let best = self
            .members
            .iter()
            .filter_map(|idx| genomes.get(*idx))
            .map(Genome::fitness)
            .max_by(f64::total_cmp);
        if let Some(best) = best {
            if best > self.best_fitness {
                self.best_fitness = best;
                self.stagnation = 0;
            }
        }

        self.extinct = self.stagnation > params.stagnation_limit;
        let size = if self.extinct {
            info!(
                members = self.len(),
                best_fitness = self.best_fitness,
                "specie stagnated"
            );
            0
        } else if avg_adjusted > 0. && avg_adjusted.is_finite() {
            let fitness = self.fitness(genomes) - floor * self.len() as f64;
            (fitness / avg_adjusted).round().max(0.) as usize
        } else {
            self.len()
        };

        self.next_size = size.min(genomes.len());
        self.next_size
    }

    /// Divide each member's raw fitness by the specie's size, scaled down further for new and
    /// extinct species
    pub fn share_fitness(&self, genomes: &mut [Genome], params: &Params) {
        let size = self.len() as f64;
        let mut multiplier = 1.;
        if self.is_new() {
            multiplier *= params.new_specie_multiplier;
        }
        if self.extinct {
            multiplier *= params.stagnant_multiplier;
        }

        for idx in &self.members {
            if let Some(genome) = genomes.get_mut(*idx) {
                genome.set_adjusted_fitness(genome.fitness() / size * multiplier);
            }
        }
    }

    /// Move every generated offspring into `dest`
    pub fn collect_offsprings(&mut self, dest: &mut Vec<Genome>) {
        dest.append(&mut self.offspring);
        self.age += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        genome::{Gene, InnoGen, NodeId},
        random::WyRng,
    };
    use approx::assert_relative_eq;

    fn binding(params: Params) -> ProbBinding<Params, WyRng> {
        ProbBinding::new(params, WyRng::seeded(0))
    }

    fn genome(weights: &[f64], fitness: f64) -> Genome {
        let mut genome = Genome::with_layout(weights.len(), 0, 1);
        let to = NodeId(weights.len() + 1);
        for (idx, weight) in weights.iter().enumerate() {
            genome.push_gene(Gene::new(idx as u64, NodeId(idx), to, *weight, true));
        }
        genome.set_fitness(fitness);
        genome
    }

    fn specie(members: &[usize]) -> Specie {
        let mut specie = Specie::new();
        for idx in members {
            specie.add_member(*idx);
        }
        specie
    }

    #[test]
    fn test_empty_never_accepts() {
        let genomes = vec![genome(&[0.5, 0.5], 0.)];
        let mut rng = binding(Params::default());
        assert!(!Specie::new().belongs_to(&genomes, &genomes[0], &mut rng));
    }

    #[test]
    fn test_identical_always_belong() {
        let genomes = (0..3).map(|_| genome(&[0.5, -0.5, 0.1], 0.)).collect::<Vec<_>>();
        for threshold in [1e-9, 0.5, 1., 100.] {
            let mut rng = binding(Params {
                specie_threshold: threshold,
                ..Params::default()
            });
            let specie = specie(&[0]);
            assert!(specie.belongs_to(&genomes, &genomes[1], &mut rng));
            assert!(specie.belongs_to(&genomes, &genomes[2], &mut rng));
        }
    }

    #[test]
    fn test_threshold() {
        let genomes = vec![genome(&[0.5, 0.5], 0.), genome(&[-0.5, -0.5], 0.)];
        let specie = specie(&[0]);
        // 2 * 1. + 0
        assert!(!specie.belongs_to(&genomes, &genomes[1], &mut binding(Params::default())));
        assert!(specie.belongs_to(
            &genomes,
            &genomes[1],
            &mut binding(Params {
                specie_threshold: 2.5,
                ..Params::default()
            })
        ));
    }

    #[test]
    fn test_geneless_never_compatible() {
        let genomes = vec![genome(&[], 0.), genome(&[], 0.)];
        let specie = specie(&[0]);
        assert!(!specie.belongs_to(&genomes, &genomes[1], &mut binding(Params::default())));
    }

    #[test]
    fn test_retained_representative() {
        let genomes = vec![genome(&[0.5, 0.5], 0.)];
        let mut rng = binding(Params::default());
        let mut specie = specie(&[0]);
        specie.retain_representative(&genomes, &mut rng);
        specie.clear_members();

        let next = vec![genome(&[0.5, 0.4], 0.), genome(&[-1., 1.], 0.)];
        assert!(specie.belongs_to(&next, &next[0], &mut rng));
        assert!(!specie.belongs_to(&next, &next[1], &mut rng));
    }

    #[test]
    fn test_compute_next_size() {
        let params = Params::default();
        let mut genomes = vec![genome(&[0.], 4.), genome(&[0.], 2.), genome(&[0.], 6.)];
        let specie = specie(&[0, 1]);
        specie.share_fitness(&mut genomes, &params);
        assert_relative_eq!(genomes[0].adjusted_fitness(), 2.);
        assert_relative_eq!(genomes[1].adjusted_fitness(), 1.);
        assert_relative_eq!(specie.fitness(&genomes), 3.);

        let mut specie = specie;
        assert_eq!(specie.compute_next_size(&genomes, 1.5, 0., &params), 2);
        assert_eq!(specie.best_fitness(), 4.);
        assert_eq!(specie.stagnation(), 0);
        assert_eq!(specie.compute_next_size(&genomes, 1., 0., &params), 3);
        assert_eq!(specie.stagnation(), 1);
        // never more than the population
        assert_eq!(specie.compute_next_size(&genomes, 0.5, 0., &params), 3);
        // no meaningful average
        assert_eq!(specie.compute_next_size(&genomes, 0., 0., &params), 2);
        assert_eq!(specie.compute_next_size(&genomes, f64::NAN, 0., &params), 2);
    }

    #[test]
    fn test_stagnation_extinction() {
        let params = Params {
            stagnation_limit: 3,
            ..Params::default()
        };
        let mut genomes = vec![genome(&[0.], 1.)];
        let mut specie = specie(&[0]);
        for _ in 0..4 {
            assert_eq!(specie.compute_next_size(&genomes, 1., 0., &params), 1);
            assert!(!specie.is_extinct());
        }
        assert_eq!(specie.compute_next_size(&genomes, 1., 0., &params), 0);
        assert!(specie.is_extinct());

        specie.share_fitness(&mut genomes, &params);
        assert_relative_eq!(
            genomes[0].adjusted_fitness(),
            params.new_specie_multiplier * params.stagnant_multiplier
        );

        genomes[0].set_fitness(2.);
        assert_eq!(specie.compute_next_size(&genomes, 2., 0., &params), 1);
        assert_eq!(specie.stagnation(), 0);
        assert!(!specie.is_extinct());
    }

    #[test]
    fn test_next_size_from_floor() {
        let params = Params::default();
        let genomes = vec![genome(&[0.], 100.), genome(&[0.], -99.99)];
        let (mut high, mut low) = (specie(&[0]), specie(&[1]));

        // measured from the lowest fitness, the average is (199.99 + 0) / 2
        let floor = -99.99;
        let avg = (100. + -99.99) / 2. - floor;
        assert_eq!(high.compute_next_size(&genomes, avg, floor, &params), 2);
        assert_eq!(low.compute_next_size(&genomes, avg, floor, &params), 0);
    }

    #[test]
    fn test_new_specie_multiplier() {
        let params = Params {
            new_specie_multiplier: 2.,
            ..Params::default()
        };
        let mut genomes = vec![genome(&[0.], 3.)];
        let mut specie = specie(&[0]);
        assert!(specie.is_new());
        specie.share_fitness(&mut genomes, &params);
        assert_relative_eq!(genomes[0].adjusted_fitness(), 6.);

        specie.collect_offsprings(&mut vec![]);
        assert!(!specie.is_new());
        specie.share_fitness(&mut genomes, &params);
        assert_relative_eq!(genomes[0].adjusted_fitness(), 3.);
    }

    #[test]
    fn test_collect_offsprings() {
        let inno = InnoGen::new(0);
        let mut rng = binding(Params::default());
        let mut specie = specie(&[0]);
        specie.offspring = vec![Genome::new(1, 1, &mut rng, &inno); 3];

        let mut dest = vec![];
        specie.collect_offsprings(&mut dest);
        assert_eq!(dest.len(), 3);
        assert!(specie.offspring().is_empty());
        specie.collect_offsprings(&mut dest);
        assert_eq!(dest.len(), 3);
    }
}
