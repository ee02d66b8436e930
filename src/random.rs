use core::cmp::min;
use rand::{Rng, RngCore, SeedableRng};
use std::{
    fs::File,
    io::{self, Read},
};

/// Every random decision taken while evolving, each of which is decided by a configured
/// probability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionEvent {
    /// run a weight mutation pass over a genome
    MutateWeight,
    /// replace a single weight instead of perturbing it
    ReplaceWeight,
    NewConnection,
    NewNode,
    /// reproduce from a single, mutated parent rather than by crossover
    SingleParent,
    /// keep a gene disabled in a crossover child if either parent had it disabled
    DisableOnCrossover,
}

/// Map a probability in [0, 1] onto the range of [RngCore::next_u64]
pub fn chance(p: f64) -> u64 {
    (p.clamp(0., 1.) * u64::MAX as f64) as u64
}

pub trait Probabilities {
    type Update;
    fn probability(&self, evt: EvolutionEvent) -> u64;
    fn update(&mut self, update: Self::Update);
}

pub trait Happens: RngCore + Probabilities {
    fn happens(&mut self, evt: EvolutionEvent) -> bool;
}

impl<T: RngCore + Probabilities> Happens for T {
    fn happens(&mut self, evt: EvolutionEvent) -> bool {
        self.probability(evt) > self.next_u64()
    }
}

pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }
}

/// Some [Probabilities] bound to the rng that rolls against them. Everything that mutates or
/// breeds genomes takes one of these.
pub struct ProbBinding<P: Probabilities, R: RngCore> {
    p: P,
    r: R,
}

impl<P: Probabilities, R: RngCore> ProbBinding<P, R> {
    pub fn new(p: P, r: R) -> Self {
        Self { p, r }
    }

    pub fn params(&self) -> &P {
        &self.p
    }

    /// Split off a new binding sharing our probabilities, seeded from our rng
    pub fn fork(&mut self) -> ProbBinding<P, WyRng>
    where
        P: Clone,
    {
        ProbBinding {
            p: self.p.clone(),
            r: WyRng::seeded(self.r.next_u64()),
        }
    }
}

impl<P: Probabilities, R: RngCore> Probabilities for ProbBinding<P, R> {
    type Update = P::Update;
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        self.p.probability(evt)
    }

    fn update(&mut self, update: Self::Update) {
        self.p.update(update);
    }
}

impl<P: Probabilities, R: RngCore> RngCore for ProbBinding<P, R> {
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest)
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

pub fn default_rng() -> io::Result<WyRng> {
    Ok(WyRng::seeded(seed_urandom()?))
}

/// Select an item with probability proportional to `fitness`. Fitnesses are shifted so the
/// lowest is zero, and every item gets a small extra weight, so an item is always returned for a
/// non-empty slice.
pub fn weighted_random_select<'a, T>(
    items: &'a [T],
    fitness: impl Fn(&T) -> f64,
    rng: &mut impl RngCore,
) -> Option<&'a T> {
    let fitnesses = items
        .iter()
        .map(|item| fitness(item))
        .map(|f| if f.is_finite() { f } else { 0. })
        .collect::<Vec<_>>();
    let min_fitness = fitnesses.iter().copied().min_by(f64::total_cmp)?;

    let shift = if min_fitness < 0. { -min_fitness } else { 0. };
    let epsilon = 1e-6;
    let weights = fitnesses
        .iter()
        .map(|f| f + shift + epsilon)
        .collect::<Vec<_>>();

    let mut threshold = rng.random::<f64>() * weights.iter().sum::<f64>();
    for (item, weight) in items.iter().zip(&weights) {
        threshold -= weight;
        if threshold <= 0. {
            return Some(item);
        }
    }

    items.last()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_t, Params};
    use core::iter::once;
    use rand::{rngs::StdRng, SeedableRng};

    fn assert_within_deviation(
        evt: EvolutionEvent,
        chance: f64,
        range: f64,
        happens: &mut impl Happens,
    ) {
        let samples = 10_000.;
        let expected = chance * samples;
        let max_deviation = expected * range;
        for _ in 0..20 {
            let incidence = once(())
                .cycle()
                .take(samples as usize)
                .filter(|()| happens.happens(evt))
                .count() as f64;
            assert!(
                (expected - incidence).abs() < max_deviation,
                "{evt:?}: {incidence} != {expected} ± {max_deviation}"
            );
        }
    }

    fn seeded<R: SeedableRng>() -> R {
        R::seed_from_u64(0x5eed)
    }

    test_t!(deviation[T: StdRng | WyRng]() {
        let mut p_bind = ProbBinding::new(Params::default(), seeded::<T>());
        for (evt, chance) in [
            (EvolutionEvent::MutateWeight, 0.8),
            (EvolutionEvent::ReplaceWeight, 0.1),
            (EvolutionEvent::NewConnection, 0.05),
            (EvolutionEvent::NewNode, 0.03),
            (EvolutionEvent::SingleParent, 0.25),
            (EvolutionEvent::DisableOnCrossover, 0.75),
        ] {
            assert_within_deviation(evt, chance, 0.33, &mut p_bind);
        }
    });

    #[test]
    fn test_chance_bounds() {
        let mut never = ProbBinding::new(
            Params::default().with_overrides(&[(EvolutionEvent::NewNode, 0.)]),
            WyRng::seeded(1),
        );
        let mut always = ProbBinding::new(
            Params::default().with_overrides(&[(EvolutionEvent::NewNode, 1.)]),
            WyRng::seeded(1),
        );
        for _ in 0..10_000 {
            assert!(!never.happens(EvolutionEvent::NewNode));
            assert!(always.happens(EvolutionEvent::NewNode));
        }
    }

    #[test]
    fn test_wyrng_fill_bytes() {
        let mut rng = WyRng::seeded(7);
        for len in [0, 1, 7, 8, 9, 31] {
            let mut buf = vec![0u8; len];
            rng.fill_bytes(&mut buf);
            assert_eq!(len, buf.len());
        }

        let mut buf = [0u8; 64];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|b| *b != 0));
    }

    #[test]
    fn test_fork_is_deterministic() {
        let mut l = ProbBinding::new(Params::default(), WyRng::seeded(3));
        let mut r = ProbBinding::new(Params::default(), WyRng::seeded(3));
        let (mut lf, mut rf) = (l.fork(), r.fork());
        for _ in 0..100 {
            assert_eq!(lf.next_u64(), rf.next_u64());
        }
    }

    #[test]
    fn test_weighted_random_select() {
        let mut rng = WyRng::seeded(5);
        assert_eq!(weighted_random_select(&[] as &[f64], |f| *f, &mut rng), None);
        assert_eq!(weighted_random_select(&[-3.], |f| *f, &mut rng), Some(&-3.));

        let items = [0., 1., 9.];
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            let pick = weighted_random_select(&items, |f| *f, &mut rng).unwrap();
            counts[items.iter().position(|i| i == pick).unwrap()] += 1;
        }
        assert!(counts[0] < 10, "{counts:?}");
        assert!(counts[2] > counts[1] * 5, "{counts:?}");
    }

    #[test]
    fn test_weighted_random_select_negative() {
        let mut rng = WyRng::seeded(6);
        let items = [-10., -5., -1.];
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            let pick = weighted_random_select(&items, |f| *f, &mut rng).unwrap();
            counts[items.iter().position(|i| i == pick).unwrap()] += 1;
        }
        // shifted to [0, 5, 9]
        assert!(counts[0] < 10, "{counts:?}");
        assert!(counts[2] > counts[1], "{counts:?}");
    }
}
