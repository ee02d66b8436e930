use criterion::Criterion;
use ffneat::{random::default_rng, EvolutionEvent, InnoGen, Params, Population};

fn bench_speciate(bench: &mut Criterion) {
    let params = Params::default().with_overrides(&[
        (EvolutionEvent::NewConnection, 0.5),
        (EvolutionEvent::NewNode, 0.2),
    ]);
    let mut population =
        Population::with_rng(100, 2, 1, params, default_rng().unwrap(), InnoGen::new(0)).unwrap();

    bench.bench_function("speciate", |b| b.iter(|| population.group_species()));
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
    bench_speciate(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
