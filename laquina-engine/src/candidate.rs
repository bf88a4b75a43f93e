use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Combinaison triée par ordre croissant, avec sa fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub numbers: Vec<u8>,
    pub score: f64,
}

impl AsRef<[u8]> for ScoredCandidate {
    fn as_ref(&self) -> &[u8] {
        &self.numbers
    }
}

/// Résultat d'un appel au moteur. `seed` est le seed effectivement utilisé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub seed: u64,
    pub candidates: Vec<ScoredCandidate>,
}

impl PredictionSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn combinations(&self) -> Vec<Vec<u8>> {
        self.candidates.iter().map(|c| c.numbers.clone()).collect()
    }
}

/// Ordre de classement : fitness décroissante, puis numéros croissants.
pub fn compare_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.numbers.cmp(&b.numbers))
}

pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(compare_ranked);
}

/// Classe puis supprime les doublons de combinaison, en gardant la première occurrence.
pub fn rank_dedup(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    rank(&mut candidates);
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.numbers.clone()));
    candidates
}
