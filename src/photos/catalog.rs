use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct QueryCatalog {
    terms: Vec<String>,
}

impl QueryCatalog {
    pub fn new(terms: Vec<String>) -> Self {
        let terms = terms
            .into_iter()
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .collect();
        QueryCatalog { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Shuffled copy of the catalog cut down to `limit` terms; `0` keeps all of them.
    pub fn pick<R: Rng + ?Sized>(&self, limit: usize, rng: &mut R) -> Vec<String> {
        let mut picked = self.terms.clone();
        picked.shuffle(rng);
        if limit > 0 {
            picked.truncate(limit);
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn catalog() -> QueryCatalog {
        QueryCatalog::new(
            ["fog", "shadow", " ", "mirror", "stairs", "corridor"]
                .iter()
                .map(|term| term.to_string())
                .collect(),
        )
    }

    #[test]
    fn drops_blank_terms() {
        assert_eq!(catalog().terms().len(), 5);
    }

    #[test]
    fn picks_a_bounded_prefix_of_distinct_terms() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = catalog().pick(3, &mut rng);
        assert_eq!(picked.len(), 3);
        let mut unique = picked.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
        assert!(picked.iter().all(|term| catalog().terms().contains(term)));
    }

    #[test]
    fn zero_or_oversized_limit_keeps_every_term() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog().pick(0, &mut rng).len(), 5);
        assert_eq!(catalog().pick(50, &mut rng).len(), 5);
    }
}
