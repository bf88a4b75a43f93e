use log::debug;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::{Rng, RngExt};

use crate::cancel::CancellationToken;
use crate::error::{EngineError, Result};
use crate::params::{EngineParams, Game, GreedyConfig};
use crate::stats::Statistics;

/// Plancher ajouté à la marginale avant l'exposant glouton.
const MARGINAL_FLOOR: f64 = 1e-3;

/// Poids d'amorçage : `freq[n] * exp(-lambda * contests_ago[n])`, multiplié par
/// `hot_cold_boost` pour les numéros absents de la fenêtre chaude.
pub fn seed_weights(stats: &Statistics, params: &EngineParams) -> Vec<f64> {
    let mut weights = vec![0.0f64; stats.game.table_len()];
    for n in stats.game.numbers() {
        let i = n as usize;
        let boost = if stats.hot[i] { 1.0 } else { params.hot_cold_boost };
        let decay = (-params.lambda * stats.contests_ago[i] as f64).exp();
        weights[i] = stats.frequency[i] as f64 * decay * boost;
    }
    weights
}

/// Numéros du domaine absents de `taken`, par ordre croissant.
pub(crate) fn unused_numbers(taken: &[u8], game: Game) -> Vec<u8> {
    game.numbers().filter(|n| !taken.contains(n)).collect()
}

pub(crate) fn pick_uniform(taken: &[u8], game: Game, rng: &mut impl Rng) -> u8 {
    let free = unused_numbers(taken, game);
    free[rng.random_range(0..free.len())]
}

/// Combinaison triée tirée uniformément sur le domaine.
pub(crate) fn random_combination(game: Game, rng: &mut impl Rng) -> Vec<u8> {
    let mut numbers = Vec::with_capacity(game.pick_count);
    while numbers.len() < game.pick_count {
        let n = pick_uniform(&numbers, game, rng);
        numbers.push(n);
    }
    numbers.sort_unstable();
    numbers
}

/// Roulette à poids cumulés sur le domaine croissant, numéros de `taken` exclus.
/// Poids tous nuls : tirage uniforme.
pub fn pick_weighted(weights: &[f64], taken: &[u8], game: Game, rng: &mut impl Rng) -> u8 {
    let masked: Vec<f64> = game
        .numbers()
        .map(|n| if taken.contains(&n) { 0.0 } else { weights[n as usize] })
        .collect();
    match WeightedIndex::new(&masked) {
        Ok(dist) => (dist.sample(rng) + 1) as u8,
        Err(_) => pick_uniform(taken, game, rng),
    }
}

/// Numéro maximisant `Π cond[s][n] * (marginal[n] + plancher)^tilt` sur les
/// numéros déjà choisis. Égalités : le plus petit numéro gagne.
pub fn greedy_next(stats: &Statistics, selected: &[u8], tilt: f64) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    for n in stats.game.numbers() {
        if selected.contains(&n) {
            continue;
        }
        let mut value = (stats.marginal[n as usize] + MARGINAL_FLOOR).powf(tilt);
        for &s in selected {
            value *= stats.conditional[s as usize][n as usize];
        }
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((n, value));
        }
    }
    best.map(|(n, _)| n)
}

fn build_candidate(
    stats: &Statistics,
    weights: &[f64],
    greedy: &GreedyConfig,
    rng: &mut impl Rng,
) -> Vec<u8> {
    let game = stats.game;
    let mut selected = Vec::with_capacity(game.pick_count);
    selected.push(pick_weighted(weights, &[], game, rng));

    while selected.len() < game.pick_count {
        let roll = rng.random::<f64>();
        let next = if roll < greedy.uniform_fallback {
            pick_uniform(&selected, game, rng)
        } else if roll < greedy.uniform_fallback + greedy.weighted_fallback {
            pick_weighted(weights, &selected, game, rng)
        } else {
            match greedy_next(stats, &selected, greedy.marginal_tilt) {
                Some(n) => n,
                None => pick_uniform(&selected, game, rng),
            }
        };
        selected.push(next);
    }

    selected.sort_unstable();
    selected
}

/// Génère `params.oversample()` candidats bruts. Le jeton est interrogé à
/// chaque candidat.
pub fn generate_candidates(
    stats: &Statistics,
    params: &EngineParams,
    rng: &mut impl Rng,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<u8>>> {
    let n_candidates = params.oversample();
    let weights = seed_weights(stats, params);
    let mut candidates = Vec::with_capacity(n_candidates);

    for _ in 0..n_candidates {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        candidates.push(build_candidate(stats, &weights, &params.greedy, rng));
    }

    debug!("{} candidats bruts générés", candidates.len());
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_history() -> Vec<[u8; 5]> {
        vec![
            [3, 18, 27, 44, 61],
            [7, 18, 33, 52, 70],
            [3, 21, 27, 59, 80],
            [12, 18, 36, 44, 77],
        ]
    }

    #[test]
    fn test_seed_weights_zero_for_unseen() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&sample_history(), &params);
        let weights = seed_weights(&stats, &params);
        assert_eq!(weights[1], 0.0);
        assert!(weights[18] > weights[3]);
    }

    #[test]
    fn test_cold_boost_applies_outside_hot_window() {
        let mut params = EngineParams::default();
        params.lambda = 0.0;
        params.hot_window = 1;
        params.hot_cold_boost = 2.0;
        let stats = Statistics::compute(&sample_history(), &params);
        let weights = seed_weights(&stats, &params);
        // 7 (froid, vu une fois) contre 12 (chaud, vu une fois)
        assert_eq!(weights[7], 2.0);
        assert_eq!(weights[12], 1.0);
    }

    #[test]
    fn test_pick_weighted_respects_exclusions() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = Game { max_num: 10, pick_count: 3 };
        let mut weights = vec![0.0; 11];
        weights[4] = 1.0;
        weights[9] = 1.0;
        for _ in 0..50 {
            assert_eq!(pick_weighted(&weights, &[4], game, &mut rng), 9);
        }
    }

    #[test]
    fn test_pick_weighted_zero_weights_fall_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = Game { max_num: 6, pick_count: 5 };
        let weights = vec![0.0; 7];
        let n = pick_weighted(&weights, &[1, 2, 3, 4, 5], game, &mut rng);
        assert_eq!(n, 6);
    }

    #[test]
    fn test_random_combination_is_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = Game { max_num: 7, pick_count: 7 };
        assert_eq!(random_combination(game, &mut rng), vec![1, 2, 3, 4, 5, 6, 7]);
        for _ in 0..20 {
            let c = random_combination(Game::QUINA, &mut rng);
            assert_eq!(c.len(), 5);
            assert!(c.windows(2).all(|w| w[0] < w[1]), "{c:?}");
        }
    }

    #[test]
    fn test_greedy_prefers_cooccurring_numbers() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&sample_history(), &params);
        let next = greedy_next(&stats, &[3], params.greedy.marginal_tilt).unwrap();
        assert_eq!(next, 27);
    }

    #[test]
    fn test_candidates_valid_and_sorted() {
        let mut params = EngineParams::default();
        params.num_predictions = 4;
        params.cands_mult = 5;
        let stats = Statistics::compute(&sample_history(), &params);
        let mut rng = StdRng::seed_from_u64(42);
        let cands = generate_candidates(&stats, &params, &mut rng, &CancellationToken::new()).unwrap();
        assert_eq!(cands.len(), 20);
        for c in &cands {
            assert_eq!(c.len(), 5);
            assert!(c.windows(2).all(|w| w[0] < w[1]), "{c:?}");
            assert!(c.iter().all(|&n| (1..=80).contains(&n)));
        }
    }

    #[test]
    fn test_empty_history_still_produces_candidates() {
        let mut params = EngineParams::default();
        params.num_predictions = 2;
        let history: Vec<[u8; 5]> = vec![];
        let stats = Statistics::compute(&history, &params);
        let mut rng = StdRng::seed_from_u64(1);
        let cands = generate_candidates(&stats, &params, &mut rng, &CancellationToken::new()).unwrap();
        assert_eq!(cands.len(), 40);
        assert!(cands.iter().all(|c| c.len() == 5));
    }

    #[test]
    fn test_cancelled_before_start() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&sample_history(), &params);
        let token = CancellationToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(1);
        let result = generate_candidates(&stats, &params, &mut rng, &token);
        assert_eq!(result, Err(EngineError::Cancelled));
    }
}
