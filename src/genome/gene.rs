use super::NodeId;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, LazyLock,
};

/// A weighted, directed connection between two nodes. Its innovation id is permanent; genes are
/// disabled, never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    pub inno: u64,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    pub enabled: bool,
}

impl Gene {
    pub fn new(inno: u64, from: NodeId, to: NodeId, weight: f64, enabled: bool) -> Self {
        Self {
            inno,
            from,
            to,
            weight,
            enabled,
        }
    }

    /// Only enabled genes not driven by the bias may be split by a new node
    pub fn is_splittable(&self) -> bool {
        self.enabled && self.from != NodeId::BIAS
    }

    pub fn path(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }
}

static GLOBAL_INNOGEN: LazyLock<InnoGen> = LazyLock::new(|| InnoGen::new(0));

/// Source of innovation ids. Clones share the same counter, so a single [InnoGen] may be handed
/// to every thread that creates genes.
#[derive(Debug, Clone)]
pub struct InnoGen {
    head: Arc<AtomicU64>,
}

impl InnoGen {
    pub fn new(head: u64) -> Self {
        Self {
            head: Arc::new(AtomicU64::new(head)),
        }
    }

    /// The process-wide counter
    pub fn global() -> Self {
        GLOBAL_INNOGEN.clone()
    }

    #[inline]
    pub fn next(&self) -> u64 {
        self.head.fetch_add(1, Ordering::SeqCst)
    }

    /// Make sure every id handed out from now on is greater than `inno`
    #[inline]
    pub fn advance_past(&self, inno: u64) {
        self.head.fetch_max(inno.saturating_add(1), Ordering::SeqCst);
    }

    pub fn head(&self) -> u64 {
        self.head.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{collections::HashSet, thread};

    #[test]
    fn test_inno_gen() {
        let inno = InnoGen::new(0);
        assert_eq!(inno.next(), 0);
        assert_eq!(inno.next(), 1);
        assert_eq!(inno.head(), 2);

        let shared = inno.clone();
        assert_eq!(shared.next(), 2);
        assert_eq!(inno.next(), 3);
    }

    #[test]
    fn test_advance_past_never_rewinds() {
        let inno = InnoGen::new(10);
        inno.advance_past(3);
        assert_eq!(inno.head(), 10);
        inno.advance_past(41);
        assert_eq!(inno.next(), 42);
    }

    #[test]
    fn test_inno_gen_concurrent() {
        let inno = InnoGen::new(0);
        let handles = (0..8)
            .map(|_| {
                let inno = inno.clone();
                thread::spawn(move || (0..1000).map(|_| inno.next()).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert!(seen.insert(id), "{id} handed out twice");
            }
        }
        assert_eq!(seen.len(), 8000);
        assert_eq!(inno.head(), 8000);
    }

    #[test]
    fn test_splittable() {
        let hidden = NodeId(4);
        assert!(Gene::new(0, NodeId(1), hidden, 1., true).is_splittable());
        assert!(!Gene::new(1, NodeId(1), hidden, 1., false).is_splittable());
        assert!(!Gene::new(2, NodeId::BIAS, hidden, 1., true).is_splittable());
    }
}
