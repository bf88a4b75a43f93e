pub mod cancel;
pub mod candidate;
pub mod diversity;
pub mod error;
pub mod evolution;
pub mod filter;
pub mod local_search;
pub mod outcome;
pub mod params;
pub mod scorer;
pub mod seeder;
pub mod stats;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use cancel::CancellationToken;
pub use candidate::{PredictionSet, ScoredCandidate};
pub use error::{EngineError, Result};
pub use outcome::{score_outcome, OutcomeReport};
pub use params::{EngineParams, FilterConfig, Game, GreedyConfig};

use crate::candidate::rank_dedup;
use crate::evolution::{evolve, EvolutionConfig};
use crate::local_search::{hill_climb, hill_climb_within};
use crate::scorer::Scorer;
use crate::seeder::{generate_candidates, random_combination};
use crate::stats::Statistics;

/// Génère au plus `params.num_predictions` grilles à partir de l'historique
/// (du plus ancien au plus récent).
///
/// Avec un seed non nul, le résultat est entièrement déterminé par
/// `(history, params)`. Une annulation rend `EngineError::Cancelled` et aucun
/// résultat partiel.
pub fn generate<D: AsRef<[u8]>>(
    history: &[D],
    params: &EngineParams,
    cancel: &CancellationToken,
) -> Result<PredictionSet> {
    params.validate()?;
    validate_history(history, params.game)?;
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let seed = resolve_seed(params.seed);
    if params.num_predictions == 0 {
        return Ok(PredictionSet { seed, candidates: Vec::new() });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let stats = Statistics::compute(history, params);
    let scorer = Scorer::new(&stats, params);

    let raw = generate_candidates(&stats, params, &mut rng, cancel)?;

    let mut refined = Vec::with_capacity(raw.len());
    for candidate in &raw {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        refined.push(hill_climb(candidate, &scorer, params.hill_iter, &mut rng));
    }

    let evolved = evolve(refined.clone(), &scorer, EvolutionConfig::from(params), &mut rng, cancel)?;

    let mut pool = refined;
    pool.extend(evolved.population);
    let mut pool = rank_dedup(pool);
    if params.use_smart_filters {
        pool.retain(|c| filter::passes(&c.numbers, &params.filter));
        if pool.len() < params.num_predictions {
            pool = top_up_filtered(pool, &scorer, params, &mut rng, cancel)?;
        }
    }
    debug!("{} candidats distincts après filtrage", pool.len());

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    let candidates = diversity::select_diverse(pool, &stats.marginal, params.num_predictions);
    Ok(PredictionSet { seed, candidates })
}

/// Tentatives de complément par grille manquante.
const TOP_UP_ATTEMPTS: usize = 200;

/// Complète un pool filtré trop maigre : combinaisons uniformes qui passent le
/// filtre, affinées par hill-climbing sans jamais quitter la zone filtrée.
/// Le nombre de tentatives est borné ; un filtre infaisable laisse le pool court.
fn top_up_filtered(
    mut pool: Vec<ScoredCandidate>,
    scorer: &Scorer<'_>,
    params: &EngineParams,
    rng: &mut impl Rng,
    cancel: &CancellationToken,
) -> Result<Vec<ScoredCandidate>> {
    let missing = params.num_predictions - pool.len();
    let accept = |c: &[u8]| filter::passes(c, &params.filter);

    for _ in 0..missing.saturating_mul(TOP_UP_ATTEMPTS) {
        if pool.len() >= params.num_predictions {
            break;
        }
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let start = random_combination(params.game, rng);
        if !accept(&start) {
            continue;
        }
        let climbed = hill_climb_within(&start, scorer, params.hill_iter, rng, &accept);
        if !pool.iter().any(|p| p.numbers == climbed.numbers) {
            pool.push(climbed);
        } else if !pool.iter().any(|p| p.numbers == start) {
            let score = scorer.score(&start);
            pool.push(ScoredCandidate { numbers: start, score });
        }
    }

    if pool.len() < params.num_predictions {
        warn!(
            "filtre trop strict : {} grilles sur {} demandées",
            pool.len(),
            params.num_predictions
        );
    }
    Ok(rank_dedup(pool))
}

/// Vérifie taille, bornes et unicité de chaque tirage de l'historique.
pub fn validate_history<D: AsRef<[u8]>>(history: &[D], game: Game) -> Result<()> {
    for (index, draw) in history.iter().enumerate() {
        let numbers = draw.as_ref();
        if numbers.len() != game.pick_count {
            return Err(EngineError::InvalidDraw {
                index,
                reason: format!("{} numéros au lieu de {}", numbers.len(), game.pick_count),
            });
        }
        for (i, &n) in numbers.iter().enumerate() {
            if !(1..=game.max_num).contains(&n) {
                return Err(EngineError::InvalidDraw {
                    index,
                    reason: format!("numéro {} hors limites (1-{})", n, game.max_num),
                });
            }
            if numbers[..i].contains(&n) {
                return Err(EngineError::InvalidDraw {
                    index,
                    reason: format!("numéro en double : {n}"),
                });
            }
        }
    }
    Ok(())
}

/// Seed 0 : seed frais tiré de l'horloge, journalisé pour pouvoir rejouer l'appel.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    let fresh = nanos.max(1);
    info!("seed dérivé de l'horloge : {fresh}");
    fresh
}
