use core::ops::ControlFlow;
use ffneat::{evolve, EvolutionHooks, Genome, Params, Scenario, Stats};
use tracing_subscriber::EnvFilter;

const POPULATION: usize = 150;
const TARGET: f64 = 3.9;

struct Xor;

impl Scenario for Xor {
    fn io(&self) -> (usize, usize) {
        (2, 1)
    }

    fn eval(&self, genome: &mut Genome) -> f64 {
        let mut fit = 4.;
        for (pair, want) in [([0., 0.], 0.), ([1., 1.], 0.), ([1., 0.], 1.), ([0., 1.], 1.)] {
            match genome.evaluate(&pair) {
                Ok(out) => fit -= (want - out[0]).powi(2),
                Err(_) => return 0.,
            }
        }
        fit
    }
}

fn hook(stats: &mut Stats<'_>) -> ControlFlow<()> {
    let Some(fittest) = stats.fittest() else {
        return ControlFlow::Continue(());
    };

    if stats.generation % 100 == 0 {
        println!(
            "fittest of gen {}: {:.4} (of {} species)",
            stats.generation,
            fittest.fitness(),
            stats.species.len()
        );
    }

    if stats.any_fitter_than(TARGET) {
        println!(
            "target met in gen {}: {:.4}",
            stats.generation,
            fittest.fitness()
        );
        if let Err(e) = fittest.to_file(format!("output/xor-{}.txt", stats.generation)) {
            eprintln!("couldn't save the champion: {e}");
        }
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}

fn main() -> ffneat::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    std::fs::create_dir_all("output")?;

    let population = evolve(
        Xor,
        POPULATION,
        Params::default(),
        EvolutionHooks::new(vec![Box::new(hook)]),
        1000,
        f64::INFINITY,
    )?;

    if let Some(best) = population.best_genome() {
        println!(
            "best after {} generations: {:.4}, {} hidden nodes",
            population.generation(),
            best.fitness(),
            best.internal()
        );
    }
    Ok(())
}
