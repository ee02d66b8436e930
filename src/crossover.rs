use crate::{
    genome::{Gene, Genome},
    random::{EvolutionEvent, Happens, ProbBinding},
    Params,
};
use rand::{Rng, RngCore};

/// Breed two genomes. The fitter parent (`l` on a tie) is primary: the child copies its nodes and
/// inherits exactly its innovation ids. Genes shared with the other parent take either parent's
/// weight, and stay disabled with some probability if either parent had them disabled.
pub fn crossover<R: RngCore>(l: &Genome, r: &Genome, rng: &mut ProbBinding<Params, R>) -> Genome {
    let (primary, secondary) = if r.fitness() > l.fitness() {
        (r, l)
    } else {
        (l, r)
    };

    let mut child = primary.skeleton();
    for gene in primary.genes().values() {
        let gene = match secondary.gene(gene.inno) {
            Some(other) => {
                let weight = if rng.random_bool(0.5) {
                    gene.weight
                } else {
                    other.weight
                };
                let enabled = if gene.enabled && other.enabled {
                    true
                } else {
                    !rng.happens(EvolutionEvent::DisableOnCrossover)
                };
                Gene {
                    weight,
                    enabled,
                    ..gene.clone()
                }
            }
            None => gene.clone(),
        };
        child.push_gene(gene);
    }

    child
}

/// Sum of absolute weight differences over the genes `repr` shares with `candidate`, the number
/// of such genes, and the number of genes only `repr` has
fn compare(repr: &Genome, candidate: &Genome) -> (f64, usize, usize) {
    let mut diff_sum = 0.;
    let mut matching = 0;
    let mut non_matching = 0;
    for gene in repr.genes().values() {
        match candidate.gene(gene.inno) {
            Some(other) => {
                diff_sum += (gene.weight - other.weight).abs();
                matching += 1;
            }
            None => non_matching += 1,
        }
    }
    (diff_sum, matching, non_matching)
}

/// if genomes share no genes, their average diff is 0
pub fn avg_weight_diff(repr: &Genome, candidate: &Genome) -> f64 {
    match compare(repr, candidate) {
        (_, 0, _) => 0.,
        (diff_sum, matching, _) => diff_sum / matching as f64,
    }
}

/// Compatibility distance of `candidate` from a specie's representative. Genomes without a single
/// gene between them have no distance, and are never compatible.
pub fn delta(repr: &Genome, candidate: &Genome, params: &Params) -> Option<f64> {
    let size = repr.genes().len().max(candidate.genes().len());
    if size == 0 {
        return None;
    }

    let (diff_sum, matching, non_matching) = compare(repr, candidate);
    let avg_weight_diff = if matching == 0 {
        0.
    } else {
        diff_sum / matching as f64
    };

    Some(
        params.matching_coefficient * avg_weight_diff
            + params.non_matching_coefficient * non_matching as f64 / size as f64,
    )
}
