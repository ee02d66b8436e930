use criterion::Criterion;
use ffneat::{random::default_rng, Callbacks, Genome, InnoGen, Params, Population};

/// Scores genomes by their output for a fixed input
struct Constant;

impl Callbacks for Constant {
    fn evaluate_genomes(&mut self, genomes: &mut [Genome]) {
        for genome in genomes.iter_mut() {
            let fitness = genome.evaluate(&[0.5, -0.5]).map_or(0., |out| out[0] + 1.);
            genome.set_fitness(fitness);
        }
    }
}

fn bench_reproduce(bench: &mut Criterion) {
    let mut population = Population::with_rng(
        100,
        2,
        1,
        Params::default(),
        default_rng().unwrap(),
        InnoGen::new(0),
    )
    .unwrap();

    bench.bench_function("train-one-generation", |b| {
        b.iter(|| population.train_one_generation(&mut Constant))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_reproduce(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
