use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use laquina_engine::evolution::{evolve, EvolutionConfig};
use laquina_engine::local_search::hill_climb;
use laquina_engine::scorer::Scorer;
use laquina_engine::stats::Statistics;
use laquina_engine::{generate, CancellationToken, EngineParams, ScoredCandidate};

fn draw_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::sample::subsequence((1u8..=80).collect::<Vec<_>>(), 5)
}

fn history_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(draw_strategy(), 0..30)
}

fn light_params(seed: u64, num_predictions: usize) -> EngineParams {
    EngineParams {
        seed,
        num_predictions,
        cands_mult: 3,
        hill_iter: 20,
        generations: 4,
        ..EngineParams::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_combinations_are_valid(
        history in history_strategy(),
        seed in 1u64..u64::MAX,
        count in 1usize..6,
    ) {
        let params = light_params(seed, count);
        let set = generate(&history, &params, &CancellationToken::new()).unwrap();
        prop_assert!(set.len() <= count);
        prop_assert_eq!(set.seed, seed);
        for c in &set.candidates {
            prop_assert_eq!(c.numbers.len(), 5);
            prop_assert!(c.numbers.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(c.numbers.iter().all(|&n| (1..=80).contains(&n)));
        }
        let mut combos = set.combinations();
        combos.sort();
        combos.dedup();
        prop_assert_eq!(combos.len(), set.len());
    }

    #[test]
    fn same_seed_same_output(history in history_strategy(), seed in 1u64..u64::MAX) {
        let params = light_params(seed, 4);
        let a = generate(&history, &params, &CancellationToken::new()).unwrap();
        let b = generate(&history, &params, &CancellationToken::new()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn hill_climb_never_degrades(
        history in history_strategy(),
        start in draw_strategy(),
        seed in any::<u64>(),
    ) {
        let params = EngineParams::default();
        let stats = Statistics::compute(&history, &params);
        let scorer = Scorer::new(&stats, &params);
        let mut rng = StdRng::seed_from_u64(seed);
        let before = scorer.score(&start);
        let after = hill_climb(&start, &scorer, 40, &mut rng);
        prop_assert!(after.score >= before);
        prop_assert_eq!(after.score, scorer.score(&after.numbers));
    }

    #[test]
    fn evolution_keeps_the_best(
        history in history_strategy(),
        population in proptest::collection::vec(draw_strategy(), 1..12),
        seed in any::<u64>(),
    ) {
        let params = EngineParams { generations: 6, ..EngineParams::default() };
        let stats = Statistics::compute(&history, &params);
        let scorer = Scorer::new(&stats, &params);
        let population: Vec<ScoredCandidate> = population
            .into_iter()
            .map(|numbers| {
                let score = scorer.score(&numbers);
                ScoredCandidate { numbers, score }
            })
            .collect();
        let initial_best = population.iter().map(|c| c.score).fold(f64::NEG_INFINITY, f64::max);

        let mut rng = StdRng::seed_from_u64(seed);
        let out = evolve(
            population,
            &scorer,
            EvolutionConfig::from(&params),
            &mut rng,
            &CancellationToken::new(),
        )
        .unwrap();
        for w in out.best_per_generation.windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
        prop_assert!(out.population[0].score >= initial_best);
    }
}
