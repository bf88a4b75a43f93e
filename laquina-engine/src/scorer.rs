use crate::params::EngineParams;
use crate::stats::Statistics;

/// Fonction de fitness, pure et déterministe :
///
/// `alpha * Σ_{i<j} (cond[a_i][a_j] + cond[a_j][a_i])`
/// `+ beta * Σ freq[a_i] / total_freq`
/// `+ gamma * Σ_i Σ_slot positional[slot][a_i]`
/// `- cluster_penalty * Σ_decade max(0, count - 1)`
pub struct Scorer<'a> {
    stats: &'a Statistics,
    alpha: f64,
    beta: f64,
    gamma: f64,
    cluster_penalty: f64,
    total_freq: f64,
    /// Apparitions par numéro, cumulées sur toutes les positions stockées.
    pos_sum: Vec<f64>,
}

impl<'a> Scorer<'a> {
    pub fn new(stats: &'a Statistics, params: &EngineParams) -> Self {
        let total = stats.total_frequency();
        let mut pos_sum = vec![0.0; stats.game.table_len()];
        for slot in &stats.positional {
            for (n, &count) in slot.iter().enumerate() {
                pos_sum[n] += count as f64;
            }
        }
        Self {
            stats,
            alpha: params.alpha,
            beta: params.beta,
            gamma: params.gamma,
            cluster_penalty: params.cluster_penalty,
            total_freq: if total == 0 { 1.0 } else { total as f64 },
            pos_sum,
        }
    }

    pub fn stats(&self) -> &Statistics {
        self.stats
    }

    pub fn score(&self, numbers: &[u8]) -> f64 {
        self.alpha * self.cooccurrence(numbers)
            + self.beta * self.marginal(numbers)
            + self.gamma * self.positional(numbers)
            - self.cluster_penalty * cluster_excess(numbers) as f64
    }

    fn cooccurrence(&self, numbers: &[u8]) -> f64 {
        let cond = &self.stats.conditional;
        let mut total = 0.0;
        for (i, &a) in numbers.iter().enumerate() {
            for &b in &numbers[i + 1..] {
                total += cond[a as usize][b as usize] + cond[b as usize][a as usize];
            }
        }
        total
    }

    fn marginal(&self, numbers: &[u8]) -> f64 {
        numbers
            .iter()
            .map(|&n| self.stats.frequency[n as usize] as f64 / self.total_freq)
            .sum()
    }

    fn positional(&self, numbers: &[u8]) -> f64 {
        numbers.iter().map(|&n| self.pos_sum[n as usize]).sum()
    }
}

/// Numéros en surnombre par dizaine (`n / 10`).
pub fn cluster_excess(numbers: &[u8]) -> usize {
    let mut decades = [0usize; 26];
    for &n in numbers {
        decades[(n / 10) as usize] += 1;
    }
    decades.iter().map(|&c| c.saturating_sub(1)).sum()
}
