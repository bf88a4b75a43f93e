use log::debug;
use rand::{Rng, RngExt};

use crate::cancel::CancellationToken;
use crate::candidate::{rank, rank_dedup, ScoredCandidate};
use crate::error::{EngineError, Result};
use crate::params::{EngineParams, Game};
use crate::scorer::Scorer;
use crate::seeder::{pick_uniform, unused_numbers};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionConfig {
    pub generations: usize,
    pub elite_count: usize,
    pub mutate_prob: f64,
}

impl From<&EngineParams> for EvolutionConfig {
    fn from(params: &EngineParams) -> Self {
        Self {
            generations: params.generations,
            elite_count: params.elite_count,
            mutate_prob: params.mutate_prob,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evolution {
    /// Population finale, classée et sans doublon.
    pub population: Vec<ScoredCandidate>,
    /// Meilleure fitness initiale puis après chaque génération.
    pub best_per_generation: Vec<f64>,
}

/// Croisement : union alternée des numéros des deux parents (a0, b0, a1, b1…),
/// tronquée à `pick_count`, complétée au hasard si nécessaire.
pub fn crossover(a: &[u8], b: &[u8], game: Game, rng: &mut impl Rng) -> Vec<u8> {
    let mut child = Vec::with_capacity(game.pick_count);
    let longest = a.len().max(b.len());
    'outer: for i in 0..longest {
        for parent in [a, b] {
            if child.len() >= game.pick_count {
                break 'outer;
            }
            if let Some(&n) = parent.get(i) {
                if !child.contains(&n) {
                    child.push(n);
                }
            }
        }
    }
    while child.len() < game.pick_count {
        let n = pick_uniform(&child, game, rng);
        child.push(n);
    }
    child.sort_unstable();
    child
}

/// Remplace un numéro tiré au hasard par un numéro absent de la combinaison.
pub fn mutate(numbers: &mut Vec<u8>, game: Game, rng: &mut impl Rng) {
    let free = unused_numbers(numbers, game);
    if free.is_empty() || numbers.is_empty() {
        return;
    }
    let position = rng.random_range(0..numbers.len());
    numbers[position] = free[rng.random_range(0..free.len())];
    numbers.sort_unstable();
}

fn best_score(population: &[ScoredCandidate]) -> f64 {
    population
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Raffinement générationnel : à chaque génération, les `elite_count`
/// meilleurs passent tels quels, le reste est issu de croisements entre
/// parents tirés dans la meilleure moitié, puis d'une mutation éventuelle.
/// La meilleure fitness ne décroît jamais d'une génération à l'autre.
pub fn evolve(
    population: Vec<ScoredCandidate>,
    scorer: &Scorer<'_>,
    config: EvolutionConfig,
    rng: &mut impl Rng,
    cancel: &CancellationToken,
) -> Result<Evolution> {
    if population.is_empty() {
        return Ok(Evolution { population, best_per_generation: Vec::new() });
    }

    let game = scorer.stats().game;
    let size = population.len();
    let elite = config.elite_count.clamp(1, size);
    let parents = (size / 2).max(1);

    let mut population = population;
    let mut best_per_generation = vec![best_score(&population)];

    for _ in 0..config.generations {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        rank(&mut population);

        let mut next: Vec<ScoredCandidate> = population[..elite].to_vec();
        while next.len() < size {
            let a = &population[rng.random_range(0..parents)];
            let b = &population[rng.random_range(0..parents)];
            let mut child = crossover(&a.numbers, &b.numbers, game, rng);
            if rng.random::<f64>() < config.mutate_prob {
                mutate(&mut child, game, rng);
            }
            let score = scorer.score(&child);
            next.push(ScoredCandidate { numbers: child, score });
        }

        population = next;
        best_per_generation.push(best_score(&population));
    }

    let population = rank_dedup(population);
    debug!(
        "évolution : {} générations, {} individus distincts, meilleur {:.4}",
        config.generations,
        population.len(),
        best_per_generation.last().copied().unwrap_or(f64::NAN)
    );

    Ok(Evolution { population, best_per_generation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Statistics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn history() -> Vec<[u8; 5]> {
        vec![
            [2, 19, 35, 48, 66],
            [2, 19, 40, 48, 71],
            [9, 19, 35, 52, 66],
            [2, 24, 35, 48, 80],
        ]
    }

    fn scored(scorer: &Scorer<'_>, numbers: &[u8]) -> ScoredCandidate {
        ScoredCandidate { numbers: numbers.to_vec(), score: scorer.score(numbers) }
    }

    #[test]
    fn test_crossover_alternates_parents() {
        let mut rng = StdRng::seed_from_u64(5);
        let child = crossover(&[1, 2, 3, 4, 5], &[10, 20, 30, 40, 50], Game::QUINA, &mut rng);
        assert_eq!(child, vec![1, 2, 3, 10, 20]);
    }

    #[test]
    fn test_crossover_pads_when_parents_overlap() {
        let mut rng = StdRng::seed_from_u64(5);
        let child = crossover(&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 5], Game::QUINA, &mut rng);
        assert_eq!(child, vec![1, 2, 3, 4, 5]);
        let child = crossover(&[1, 2], &[2, 1], Game::QUINA, &mut rng);
        assert_eq!(child.len(), 5);
        assert!(child.contains(&1) && child.contains(&2));
        assert!(child.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_mutate_keeps_distinct() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let mut numbers = vec![1, 2, 3, 4, 5];
            mutate(&mut numbers, Game::QUINA, &mut rng);
            let mut dedup = numbers.clone();
            dedup.dedup();
            assert_eq!(dedup.len(), 5);
            assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_empty_population() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(1);
        let out = evolve(Vec::new(), &scorer, (&params).into(), &mut rng, &CancellationToken::new()).unwrap();
        assert!(out.population.is_empty());
    }

    #[test]
    fn test_best_fitness_non_decreasing() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let population = vec![
            scored(&scorer, &[1, 3, 5, 7, 9]),
            scored(&scorer, &[11, 13, 15, 17, 19]),
            scored(&scorer, &[21, 23, 25, 27, 29]),
            scored(&scorer, &[2, 19, 35, 48, 66]),
            scored(&scorer, &[60, 61, 62, 63, 64]),
            scored(&scorer, &[70, 72, 74, 76, 78]),
        ];
        let initial_best = best_score(&population);
        let mut rng = StdRng::seed_from_u64(21);
        let out = evolve(population, &scorer, (&params).into(), &mut rng, &CancellationToken::new()).unwrap();

        assert_eq!(out.best_per_generation.len(), params.generations + 1);
        assert_eq!(out.best_per_generation[0], initial_best);
        for w in out.best_per_generation.windows(2) {
            assert!(w[1] >= w[0], "régression : {} -> {}", w[0], w[1]);
        }
        assert!(out.population.len() <= 6);
        assert!(out.population[0].score >= initial_best);
    }

    #[test]
    fn test_population_deduplicated() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let population = vec![scored(&scorer, &[2, 19, 35, 48, 66]); 8];
        let mut rng = StdRng::seed_from_u64(4);
        let mut config = EvolutionConfig::from(&params);
        config.mutate_prob = 0.0;
        let out = evolve(population, &scorer, config, &mut rng, &CancellationToken::new()).unwrap();
        assert_eq!(out.population.len(), 1);
    }

    #[test]
    fn test_cancel_between_generations() {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history(), &params);
        let scorer = Scorer::new(&stats, &params);
        let token = CancellationToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(4);
        let result = evolve(vec![scored(&scorer, &[1, 2, 3, 4, 5])], &scorer, (&params).into(), &mut rng, &token);
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
