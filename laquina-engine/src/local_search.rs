use rand::{Rng, RngExt};

use crate::candidate::ScoredCandidate;
use crate::scorer::Scorer;
use crate::seeder::unused_numbers;

/// Hill-climbing sur une combinaison : à chaque itération, une position et un
/// numéro de remplacement absent de la combinaison sont tirés au hasard ; la
/// substitution n'est gardée que si le score augmente strictement.
///
/// Le budget est toujours consommé en entier. Le score rendu est `>=` à celui
/// de l'entrée.
pub fn hill_climb(
    numbers: &[u8],
    scorer: &Scorer<'_>,
    iterations: usize,
    rng: &mut impl Rng,
) -> ScoredCandidate {
    hill_climb_within(numbers, scorer, iterations, rng, |_| true)
}

/// Variante contrainte : une substitution n'est retenue que si la nouvelle
/// combinaison satisfait aussi `accept`. Une entrée qui satisfait `accept`
/// rend donc une sortie qui la satisfait.
pub fn hill_climb_within(
    numbers: &[u8],
    scorer: &Scorer<'_>,
    iterations: usize,
    rng: &mut impl Rng,
    accept: impl Fn(&[u8]) -> bool,
) -> ScoredCandidate {
    let game = scorer.stats().game;
    let mut current = numbers.to_vec();
    let mut current_score = scorer.score(&current);

    // aucun remplaçant possible quand la combinaison couvre tout le domaine
    if current.len() >= game.max_num as usize {
        return ScoredCandidate { numbers: current, score: current_score };
    }

    let mut trial = current.clone();
    for _ in 0..iterations {
        let position = rng.random_range(0..current.len());
        let free = unused_numbers(&current, game);
        let replacement = free[rng.random_range(0..free.len())];

        trial.copy_from_slice(&current);
        trial[position] = replacement;
        trial.sort_unstable();

        let trial_score = scorer.score(&trial);
        if trial_score > current_score && accept(&trial) {
            current.copy_from_slice(&trial);
            current_score = trial_score;
        }
    }

    ScoredCandidate { numbers: current, score: current_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EngineParams;
    use crate::stats::Statistics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn history() -> Vec<[u8; 5]> {
        vec![
            [4, 15, 26, 37, 48],
            [4, 15, 26, 59, 70],
            [4, 15, 33, 59, 71],
            [8, 15, 26, 37, 79],
        ]
    }

    #[test]
    fn test_zero_budget_is_noop() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(3);
        let input = [1, 2, 3, 4, 5];
        let out = hill_climb(&input, &scorer, 0, &mut rng);
        assert_eq!(out.numbers, input.to_vec());
        assert_eq!(out.score, scorer.score(&input));
    }

    #[test]
    fn test_score_never_decreases() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(11);
        let input = [1, 2, 3, 6, 9];
        let before = scorer.score(&input);
        let out = hill_climb(&input, &scorer, 300, &mut rng);
        assert!(out.score >= before);
        assert!(out.score > before, "300 itérations devraient trouver mieux");
        assert!(out.numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.score, scorer.score(&out.numbers));
    }

    #[test]
    fn test_constrained_climb_keeps_constraint() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(17);
        let input = [12, 25, 38, 51, 64];
        let before = scorer.score(&input);
        let out = hill_climb_within(&input, &scorer, 300, &mut rng, |c| {
            crate::filter::passes(c, &params.filter)
        });
        assert!(out.score >= before);
        assert!(crate::filter::passes(&out.numbers, &params.filter), "{:?}", out.numbers);
    }

    #[test]
    fn test_full_domain_candidate_unchanged() {
        let mut params = EngineParams::default();
        params.game.max_num = 5;
        let stats = Statistics::compute(&[[1u8, 2, 3, 4, 5]], &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(3);
        let out = hill_climb(&[1, 2, 3, 4, 5], &scorer, 50, &mut rng);
        assert_eq!(out.numbers, vec![1, 2, 3, 4, 5]);
    }
}
