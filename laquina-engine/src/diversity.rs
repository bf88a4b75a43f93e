use crate::candidate::ScoredCandidate;

/// Sélection gloutonne de couverture : on prend à chaque tour le candidat qui
/// apporte le plus de masse marginale encore non couverte par les grilles
/// retenues. `pool` doit être classé par fitness décroissante ; à gain égal,
/// le premier (donc le plus fort) l'emporte.
///
/// Rend moins de `count` grilles si le pool s'épuise.
pub fn select_diverse(
    mut pool: Vec<ScoredCandidate>,
    marginal: &[f64],
    count: usize,
) -> Vec<ScoredCandidate> {
    let mut taken = vec![false; marginal.len()];
    let mut selected = Vec::with_capacity(count.min(pool.len()));

    while selected.len() < count && !pool.is_empty() {
        let mut best_idx = 0;
        let mut best_gain = f64::NEG_INFINITY;
        for (i, candidate) in pool.iter().enumerate() {
            let gain = uncovered_mass(&candidate.numbers, marginal, &taken);
            if gain > best_gain {
                best_gain = gain;
                best_idx = i;
            }
        }

        let chosen = pool.remove(best_idx);
        for &n in &chosen.numbers {
            if let Some(t) = taken.get_mut(n as usize) {
                *t = true;
            }
        }
        selected.push(chosen);
    }

    selected
}

fn uncovered_mass(numbers: &[u8], marginal: &[f64], taken: &[bool]) -> f64 {
    numbers
        .iter()
        .map(|&n| n as usize)
        .filter(|&i| !taken.get(i).copied().unwrap_or(true))
        .map(|i| marginal[i])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(numbers: &[u8], score: f64) -> ScoredCandidate {
        ScoredCandidate { numbers: numbers.to_vec(), score }
    }

    fn marginal_for(hot: &[u8]) -> Vec<f64> {
        let mut m = vec![0.01; 81];
        m[0] = 0.0;
        for &n in hot {
            m[n as usize] = 0.5;
        }
        m
    }

    #[test]
    fn test_avoids_overlapping_grids() {
        let marginal = marginal_for(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let pool = vec![
            cand(&[1, 2, 3, 4, 5], 3.0),
            cand(&[1, 2, 3, 4, 6], 2.9),
            cand(&[6, 7, 8, 9, 10], 1.0),
        ];
        let selected = select_diverse(pool, &marginal, 2);
        assert_eq!(selected[0].numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(selected[1].numbers, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_ties_go_to_higher_fitness() {
        let marginal = vec![0.0; 81];
        let pool = vec![cand(&[1, 2, 3, 4, 5], 5.0), cand(&[6, 7, 8, 9, 10], 4.0)];
        let selected = select_diverse(pool, &marginal, 1);
        assert_eq!(selected[0].score, 5.0);
    }

    #[test]
    fn test_exhausted_pool_returns_fewer() {
        let marginal = marginal_for(&[]);
        let pool = vec![cand(&[1, 2, 3, 4, 5], 1.0)];
        let selected = select_diverse(pool, &marginal, 5);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_zero_count() {
        let marginal = marginal_for(&[]);
        let selected = select_diverse(vec![cand(&[1, 2, 3, 4, 5], 1.0)], &marginal, 0);
        assert!(selected.is_empty());
    }
}
