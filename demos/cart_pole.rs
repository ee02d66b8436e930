use core::{f64::consts::PI, ops::ControlFlow};
use ffneat::{
    random::default_rng, Evolution, EvolutionHooks, Genome, InnoGen, Params, Population, Scenario,
    Stats,
};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const POPULATION: usize = 200;
const SYSTEMS: usize = 10;
const DT: f64 = 0.02;
const SECONDS: f64 = 30.;

/// Single pole balanced on a cart moving along a bounded track
#[derive(Debug, Clone)]
struct CartPole {
    init: [f64; 4],
    pole_angle: f64,
    pole_velocity: f64,
    cart_position: f64,
    cart_velocity: f64,
}

impl CartPole {
    const POLE_MASS: f64 = 0.1;
    const POLE_HALF_LENGTH: f64 = 0.5;
    const POLE_FAILURE_ANGLE: f64 = 0.2094384;
    const POLE_FRICTION: f64 = 0.1;
    const CART_MASS: f64 = 1.;
    const TRACK_HALF_SIZE: f64 = 2.4;
    const CART_FRICTION: f64 = 0.;
    const GRAVITY: f64 = 9.81;
    const INPUT_FORCE: f64 = 10.;

    /// Start state drawn uniformly within `variance` of rest, with the pole upright
    fn new(variance: f64, rng: &mut impl Rng) -> Self {
        let mut init = [0.; 4];
        if variance > f64::EPSILON {
            let mut roll = || rng.random_range(-variance..=variance);
            init = [
                roll() * PI,
                roll() * 3.,
                roll() * Self::TRACK_HALF_SIZE,
                roll() * 3.,
            ];
        }

        let mut system = Self {
            init,
            pole_angle: 0.,
            pole_velocity: 0.,
            cart_position: 0.,
            cart_velocity: 0.,
        };
        system.reset();
        system
    }

    fn reset(&mut self) {
        [
            self.pole_angle,
            self.pole_velocity,
            self.cart_position,
            self.cart_velocity,
        ] = self.init;
    }

    /// pole angle wrapped to [-pi, pi]
    fn angle(&self) -> f64 {
        self.pole_angle.sin().atan2(self.pole_angle.cos())
    }

    fn is_pole_up(&self) -> bool {
        self.angle().abs() <= Self::POLE_FAILURE_ANGLE
    }

    fn is_slow_and_centered(&self) -> bool {
        self.cart_position.abs() <= Self::TRACK_HALF_SIZE / 10.
            && self.cart_velocity.abs() <= 1.
            && self.pole_velocity.abs() <= 1.
    }

    fn inputs(&self) -> [f64; 4] {
        [
            self.angle(),
            self.pole_velocity,
            self.cart_position,
            self.cart_velocity,
        ]
    }

    fn update(&mut self, amplitude: f64, dt: f64) {
        let (sin, cos) = self.pole_angle.sin_cos();
        let at_right = self.cart_position >= Self::TRACK_HALF_SIZE;
        let at_left = self.cart_position <= -Self::TRACK_HALF_SIZE;

        let mut force = amplitude * Self::INPUT_FORCE;
        if (force > 0. && at_right) || (force < 0. && at_left) {
            force = 0.;
        }

        let total_mass = Self::CART_MASS + Self::POLE_MASS;
        let ml = Self::POLE_MASS * Self::POLE_HALF_LENGTH;
        let tmp = (force + ml * self.pole_velocity.powi(2) * sin) / total_mass;

        let pole_acc = (Self::GRAVITY * sin - cos * tmp)
            / (Self::POLE_HALF_LENGTH * (4. / 3. - Self::POLE_MASS * cos * cos / total_mass))
            - self.pole_velocity * Self::POLE_FRICTION;
        let cart_acc = tmp - ml * self.pole_velocity * pole_acc * cos / total_mass
            - self.cart_velocity * Self::CART_FRICTION;

        self.pole_velocity += dt * pole_acc;
        self.pole_angle += dt * self.pole_velocity;

        self.cart_velocity += dt * cart_acc;
        if (self.cart_velocity > 0. && at_right) || (self.cart_velocity < 0. && at_left) {
            self.cart_velocity = 0.;
        }
        self.cart_position += dt * self.cart_velocity;
    }
}

/// Rewards every step spent with the pole up and the cart slow and centered, across a fixed set
/// of start states. A perfect controller scores 1.
struct Balance {
    systems: Vec<CartPole>,
}

impl Scenario for Balance {
    fn io(&self) -> (usize, usize) {
        (4, 2)
    }

    fn eval(&self, genome: &mut Genome) -> f64 {
        let steps = (SECONDS / DT) as usize;
        let step_fitness = 1. / (steps * self.systems.len()) as f64;

        let mut fit = 0.;
        for mut system in self.systems.iter().cloned() {
            system.reset();
            for _ in 0..steps {
                let Ok(out) = genome.evaluate(&system.inputs()) else {
                    return 0.;
                };
                let force = if out[0] < out[1] { -1. } else { 1. };
                system.update(force, DT);

                if system.is_pole_up() && system.is_slow_and_centered() {
                    fit += step_fitness;
                }
            }
        }
        fit
    }
}

fn hook(stats: &mut Stats<'_>) -> ControlFlow<()> {
    let Some(fittest) = stats.fittest() else {
        return ControlFlow::Continue(());
    };

    info!(
        generation = stats.generation,
        population = stats.genomes.len(),
        species = stats.species.len(),
        best_fitness = fittest.fitness(),
        "generation done"
    );

    if stats.generation % 100 == 0 {
        if let Err(e) = fittest.to_file(format!("output/cart-pole-{}.txt", stats.generation)) {
            eprintln!("couldn't save gen {} champion: {e}", stats.generation);
        }
    }
    ControlFlow::Continue(())
}

fn main() -> ffneat::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    std::fs::create_dir_all("output")?;

    let mut rng = default_rng()?;
    let balance = Balance {
        systems: (0..SYSTEMS).map(|_| CartPole::new(1., &mut rng)).collect(),
    };

    // replay a saved champion instead of training
    if let Some(path) = std::env::args().nth(1) {
        let mut genome = Genome::from_file(&path, &InnoGen::global())?;
        println!("{path}: {:.4}", balance.eval(&mut genome));
        return Ok(());
    }

    let (sensory, action) = balance.io();
    let mut population = Population::new(POPULATION, sensory, action, Params::default())?;
    let mut evolution = Evolution::new(balance, EvolutionHooks::new(vec![Box::new(hook)]));
    let generations = population.train_generations(&mut evolution, 500, 1. - 1e-9);

    if let Some(best) = population.best_genome() {
        best.to_file("output/cart-pole.txt")?;
        println!(
            "best fitness after {generations} generations: {:.4}",
            best.fitness()
        );
    }
    Ok(())
}
