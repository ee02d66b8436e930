//! Feed-forward NEAT: genomes whose topology and weights evolve together, protected by speciation.

pub mod constants;
pub mod crossover;
pub mod error;
pub mod genome;
pub mod macros;
pub mod params;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod scenario;
pub mod serialize;
pub mod specie;

pub use error::{Error, Result};
pub use genome::{Gene, Genome, InnoGen, Node, NodeId, NodeKind};
pub use params::Params;
pub use population::Population;
pub use random::{EvolutionEvent, Happens, ProbBinding, Probabilities, WyRng};
pub use scenario::{evolve, Callbacks, Evolution, EvolutionHooks, Hook, Scenario, Stats};
pub use specie::Specie;
