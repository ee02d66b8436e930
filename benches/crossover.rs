use criterion::Criterion;
use ffneat::{
    crossover::{avg_weight_diff, crossover, delta},
    random::default_rng,
    EvolutionEvent, Genome, InnoGen, Params, ProbBinding, WyRng,
};

fn grown(rounds: usize, rng: &mut ProbBinding<Params, WyRng>, inno: &InnoGen) -> Genome {
    let mut genome = Genome::new(8, 4, rng, inno);
    for _ in 0..rounds {
        genome.mutate(rng, inno);
    }
    genome
}

fn bench_crossover(bench: &mut Criterion) {
    let params = Params::default().with_overrides(&[
        (EvolutionEvent::NewConnection, 0.5),
        (EvolutionEvent::NewNode, 0.2),
    ]);
    let mut rng = ProbBinding::new(params.clone(), default_rng().unwrap());
    let inno = InnoGen::new(0);

    let mut l = grown(150, &mut rng, &inno);
    let mut r = grown(150, &mut rng, &inno);
    l.set_fitness(2.);
    r.set_fitness(1.);

    bench.bench_function("crossover-ne", |b| b.iter(|| crossover(&l, &r, &mut rng)));

    r.set_fitness(2.);
    bench.bench_function("crossover-eq", |b| b.iter(|| crossover(&l, &r, &mut rng)));

    bench.bench_function("avg-weight-diff", |b| b.iter(|| avg_weight_diff(&l, &r)));
    bench.bench_function("delta", |b| b.iter(|| delta(&l, &r, &params)));
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
    bench_crossover(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
