use serde::{Deserialize, Serialize};

/// Bilan d'un jeu de grilles face à un tirage réel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeReport {
    /// Numéros trouvés par grille, dans l'ordre des grilles.
    pub hits: Vec<usize>,
    pub best_hits: usize,
    /// Première grille atteignant `best_hits` (`None` si aucune grille).
    pub best_index: Option<usize>,
    /// Numéros communs entre la meilleure grille et le tirage.
    pub matched: Vec<u8>,
    /// Grilles à `pick_count` bons numéros.
    pub jackpot: usize,
    /// Grilles à `pick_count - 1`.
    pub minus_one: usize,
    /// Grilles à `pick_count - 2`.
    pub minus_two: usize,
    /// `histogram[k]` : grilles à exactement `k` bons numéros.
    pub histogram: Vec<usize>,
}

impl OutcomeReport {
    /// Bilan vide, base des agrégations.
    pub fn empty(pick_count: usize) -> Self {
        Self {
            hits: Vec::new(),
            best_hits: 0,
            best_index: None,
            matched: Vec::new(),
            jackpot: 0,
            minus_one: 0,
            minus_two: 0,
            histogram: vec![0; pick_count + 1],
        }
    }

    /// Agrège un autre bilan (tiers et histogramme) pour les backtests.
    pub fn absorb(&mut self, other: &OutcomeReport) {
        self.jackpot += other.jackpot;
        self.minus_one += other.minus_one;
        self.minus_two += other.minus_two;
        if self.histogram.len() < other.histogram.len() {
            self.histogram.resize(other.histogram.len(), 0);
        }
        for (acc, &h) in self.histogram.iter_mut().zip(other.histogram.iter()) {
            *acc += h;
        }
    }
}

pub fn score_outcome<P: AsRef<[u8]>>(predictions: &[P], actual: &[u8]) -> OutcomeReport {
    let pick_count = actual.len();
    let mut report = OutcomeReport::empty(pick_count);

    for (i, prediction) in predictions.iter().enumerate() {
        let numbers = prediction.as_ref();
        let hits = numbers.iter().filter(|&&n| actual.contains(&n)).count();
        report.hits.push(hits);
        if hits < report.histogram.len() {
            report.histogram[hits] += 1;
        }

        if hits == pick_count {
            report.jackpot += 1;
        } else if Some(hits) == pick_count.checked_sub(1) {
            report.minus_one += 1;
        } else if Some(hits) == pick_count.checked_sub(2) {
            report.minus_two += 1;
        }

        if report.best_index.is_none() || hits > report.best_hits {
            report.best_hits = hits;
            report.best_index = Some(i);
            report.matched = numbers.iter().copied().filter(|n| actual.contains(n)).collect();
        }
    }

    report
}
