//! Tunable evolution parameters, with defaults drawn from [crate::constants].

use crate::{
    constants::*,
    error::{Error, Result},
    random::{chance, EvolutionEvent, Probabilities},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub mutate_weight: f64,
    pub replace_weight: f64,
    pub perturb_scale: f64,
    pub weight_min: f64,
    pub weight_max: f64,

    pub new_connection: f64,
    pub new_node: f64,

    pub single_parent: f64,
    pub disable_on_crossover: f64,
    pub survival_fraction: f64,

    pub specie_threshold: f64,
    pub matching_coefficient: f64,
    pub non_matching_coefficient: f64,
    pub stagnation_limit: usize,
    pub stagnant_multiplier: f64,
    pub new_specie_multiplier: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            mutate_weight: NEAT_MUTATE_WEIGHT_PROB,
            replace_weight: NEAT_REPLACE_WEIGHT_PROB,
            perturb_scale: NEAT_PERTURB_WEIGHT_SCALE,
            weight_min: NEAT_WEIGHT_MIN,
            weight_max: NEAT_WEIGHT_MAX,
            new_connection: NEAT_NEW_CONNECTION_PROB,
            new_node: NEAT_NEW_NODE_PROB,
            single_parent: NEAT_SINGLE_PARENT_PROB,
            disable_on_crossover: NEAT_DISABLE_ON_CROSSOVER_PROB,
            survival_fraction: NEAT_SURVIVAL_FRACTION,
            specie_threshold: NEAT_SPECIE_THRESHOLD,
            matching_coefficient: NEAT_MATCHING_COEFFICIENT,
            non_matching_coefficient: NEAT_NON_MATCHING_COEFFICIENT,
            stagnation_limit: NEAT_STAGNATION_LIMIT,
            stagnant_multiplier: NEAT_STAGNANT_FITNESS_MULTIPLIER,
            new_specie_multiplier: NEAT_NEW_SPECIE_FITNESS_MULTIPLIER,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidParam {
        name,
        reason: reason.into(),
    }
}

impl Params {
    pub fn with_overrides(mut self, updates: &[(EvolutionEvent, f64)]) -> Self {
        for update in updates {
            self.update(*update);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("mutate_weight", self.mutate_weight),
            ("replace_weight", self.replace_weight),
            ("new_connection", self.new_connection),
            ("new_node", self.new_node),
            ("single_parent", self.single_parent),
            ("disable_on_crossover", self.disable_on_crossover),
        ] {
            if !(0. ..=1.).contains(&p) {
                return Err(invalid(name, format!("probability {p} outside of [0, 1]")));
            }
        }

        if !self.weight_min.is_finite()
            || !self.weight_max.is_finite()
            || self.weight_min >= self.weight_max
        {
            return Err(invalid(
                "weight_min",
                format!("empty weight range [{}, {}]", self.weight_min, self.weight_max),
            ));
        }

        if !self.perturb_scale.is_finite() || self.perturb_scale < 0. {
            return Err(invalid("perturb_scale", format!("{}", self.perturb_scale)));
        }

        if !(self.survival_fraction > 0. && self.survival_fraction <= 1.) {
            return Err(invalid(
                "survival_fraction",
                format!("{} outside of (0, 1]", self.survival_fraction),
            ));
        }

        if !(self.specie_threshold.is_finite() && self.specie_threshold > 0.) {
            return Err(invalid(
                "specie_threshold",
                format!("{} must be positive", self.specie_threshold),
            ));
        }

        for (name, v) in [
            ("matching_coefficient", self.matching_coefficient),
            ("non_matching_coefficient", self.non_matching_coefficient),
            ("stagnant_multiplier", self.stagnant_multiplier),
            ("new_specie_multiplier", self.new_specie_multiplier),
        ] {
            if !v.is_finite() || v < 0. {
                return Err(invalid(name, format!("{v} must be finite and non-negative")));
            }
        }

        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }
}

impl Probabilities for Params {
    type Update = (EvolutionEvent, f64);

    fn probability(&self, evt: EvolutionEvent) -> u64 {
        chance(match evt {
            EvolutionEvent::MutateWeight => self.mutate_weight,
            EvolutionEvent::ReplaceWeight => self.replace_weight,
            EvolutionEvent::NewConnection => self.new_connection,
            EvolutionEvent::NewNode => self.new_node,
            EvolutionEvent::SingleParent => self.single_parent,
            EvolutionEvent::DisableOnCrossover => self.disable_on_crossover,
        })
    }

    fn update(&mut self, (evt, v): Self::Update) {
        match evt {
            EvolutionEvent::MutateWeight => self.mutate_weight = v,
            EvolutionEvent::ReplaceWeight => self.replace_weight = v,
            EvolutionEvent::NewConnection => self.new_connection = v,
            EvolutionEvent::NewNode => self.new_node = v,
            EvolutionEvent::SingleParent => self.single_parent = v,
            EvolutionEvent::DisableOnCrossover => self.disable_on_crossover = v,
        }
    }
}
