//! Text encoding of a genome. The header holds the sensory, internal and action node counts,
//! every following record a single gene, with endpoints given as execution positions:
//!
//! ```text
//! 2;1;1;
//! 0 0 4 0.25 1;
//! 1 1 4 -0.5 0;
//! ```

use crate::{
    constants::NEAT_MAX_SERIALIZED_NODES,
    error::{Error, Result},
    genome::{Gene, Genome, InnoGen, NodeId, NodeKind},
};
use std::{fs, path::Path};
use tracing::{info, warn};

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

impl Genome {
    pub fn to_text(&self) -> String {
        let positions = self.positions();
        let mut text = format!("{};{};{};\n", self.sensory(), self.internal(), self.action());
        for gene in self.genes().values() {
            text.push_str(&format!(
                "{} {} {} {} {};\n",
                gene.inno,
                positions[gene.from.0],
                positions[gene.to.0],
                gene.weight,
                u8::from(gene.enabled),
            ));
        }
        text
    }

    /// Decode a genome from its text form. Malformed gene records are skipped. `inno` is
    /// advanced past every innovation id loaded.
    pub fn from_text(text: &str, inno: &InnoGen) -> Result<Self> {
        let mut records = text.split(';').map(str::trim).filter(|r| !r.is_empty());

        let mut header = [0usize; 3];
        for count in header.iter_mut() {
            let record = records
                .next()
                .ok_or_else(|| Error::MalformedHeader("missing node count".into()))?;
            *count = record
                .parse()
                .map_err(|_| Error::MalformedHeader(format!("bad node count {record:?}")))?;
        }
        let [sensory, internal, action] = header;
        let nodes = sensory
            .checked_add(internal)
            .and_then(|n| n.checked_add(action));
        if !nodes.is_some_and(|n| n < NEAT_MAX_SERIALIZED_NODES) {
            return Err(Error::MalformedHeader(format!(
                "too many nodes: {sensory};{internal};{action}"
            )));
        }

        let mut genome = Genome::with_layout(sensory, internal, action);
        let order = genome.order().to_vec();
        for record in records {
            let Some((gene, from, to)) = Self::parse_gene(record, &order) else {
                warn!(record, "skipping malformed gene record");
                continue;
            };

            if from >= to {
                warn!(record, "skipping gene against execution order");
                continue;
            }

            let (src, dst) = (genome.node(gene.from).kind(), genome.node(gene.to).kind());
            if src == NodeKind::Action || matches!(dst, NodeKind::Bias | NodeKind::Sensory) {
                warn!(record, "skipping gene with out of range endpoints");
                continue;
            }

            if genome.gene(gene.inno).is_some() {
                warn!(record, "skipping duplicate innovation id");
                continue;
            }

            inno.advance_past(gene.inno);
            genome.push_gene(gene);
        }

        Ok(genome)
    }

    /// A gene record along with the execution positions of its endpoints
    fn parse_gene(record: &str, order: &[NodeId]) -> Option<(Gene, usize, usize)> {
        let fields = record.split_whitespace().collect::<Vec<_>>();
        let [inno, from, to, weight, enabled] = fields[..] else {
            return None;
        };

        let (from, to) = (from.parse::<usize>().ok()?, to.parse::<usize>().ok()?);
        let gene = Gene::new(
            inno.parse().ok()?,
            *order.get(from)?,
            *order.get(to)?,
            weight.parse().ok().filter(|w: &f64| w.is_finite())?,
            parse_flag(enabled)?,
        );
        Some((gene, from, to))
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_text())?;
        info!(path = %path.as_ref().display(), genes = self.genes().len(), "saved genome");
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P, inno: &InnoGen) -> Result<Self> {
        Self::from_text(&fs::read_to_string(path)?, inno)
    }
}
