//! Centralized defaults for every evolution parameter.
//!
//! All configurable parameters are defined here with the `NEAT_` prefix, and are what
//! [crate::Params::default] is built from.

// ============================================================================
// Weight Mutation Parameters
// ============================================================================

/// Probability of running a weight mutation pass over a genome
pub const NEAT_MUTATE_WEIGHT_PROB: f64 = 0.8;

/// Probability, per gene, of replacing its weight instead of perturbing it
pub const NEAT_REPLACE_WEIGHT_PROB: f64 = 0.1;

/// Standard deviation of the gaussian noise added to a perturbed weight
pub const NEAT_PERTURB_WEIGHT_SCALE: f64 = 0.05;

/// Lower bound of any gene weight
pub const NEAT_WEIGHT_MIN: f64 = -1.0;

/// Upper bound of any gene weight
pub const NEAT_WEIGHT_MAX: f64 = 1.0;

// ============================================================================
// Structural Mutation Parameters
// ============================================================================

/// Probability of adding a connection
pub const NEAT_NEW_CONNECTION_PROB: f64 = 0.05;

/// Probability of splitting a connection with a new hidden node
pub const NEAT_NEW_NODE_PROB: f64 = 0.03;

// ============================================================================
// Reproduction Parameters
// ============================================================================

/// Probability that an offspring is a mutated clone rather than a crossover child
pub const NEAT_SINGLE_PARENT_PROB: f64 = 0.25;

/// Probability that a gene disabled in either parent stays disabled in the child
pub const NEAT_DISABLE_ON_CROSSOVER_PROB: f64 = 0.75;

/// Fraction of a specie's best members eligible as parents
pub const NEAT_SURVIVAL_FRACTION: f64 = 0.3;

// ============================================================================
// Speciation Parameters
// ============================================================================

/// Compatibility distance under which a genome joins a specie
pub const NEAT_SPECIE_THRESHOLD: f64 = 1.0;

/// Coefficient of the average weight difference of matching genes
pub const NEAT_MATCHING_COEFFICIENT: f64 = 2.0;

/// Coefficient of the normalized non-matching gene count
pub const NEAT_NON_MATCHING_COEFFICIENT: f64 = 1.0;

/// Number of generations without improvement before a specie goes extinct
pub const NEAT_STAGNATION_LIMIT: usize = 10;

/// Fitness multiplier applied to species slated for extinction
pub const NEAT_STAGNANT_FITNESS_MULTIPLIER: f64 = 0.01;

/// Fitness multiplier applied to species in their first generation
pub const NEAT_NEW_SPECIE_FITNESS_MULTIPLIER: f64 = 1.0;

// ============================================================================
// Serialization Parameters
// ============================================================================

/// Largest node count a genome header may declare
pub const NEAT_MAX_SERIALIZED_NODES: usize = 1 << 20;
