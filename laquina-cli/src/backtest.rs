use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use laquina_db::db::insert_backtest_result;
use laquina_db::models::{BacktestRecord, Draw};
use laquina_db::rusqlite::Connection;
use laquina_engine::stats::recent;
use laquina_engine::{CancellationToken, EngineParams, OutcomeReport, PredictionSet, generate, score_outcome};

/// Résultat d'un concours rejoué.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestResult {
    pub contest: u32,
    pub predictions: PredictionSet,
    pub outcome: OutcomeReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub rows: Vec<ContestResult>,
    /// Compteurs de rangs et histogramme cumulés.
    pub totals: OutcomeReport,
    pub mean_best_hits: f64,
}

impl BacktestSummary {
    fn from_rows(rows: Vec<ContestResult>, pick_count: usize) -> Self {
        let mut totals = OutcomeReport::empty(pick_count);
        for row in &rows {
            totals.absorb(&row.outcome);
        }
        let mean_best_hits = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.outcome.best_hits as f64).sum::<f64>() / rows.len() as f64
        };
        Self { rows, totals, mean_best_hits }
    }
}

/// Indices (dans l'historique croissant) des `contests` derniers concours
/// rejouables. Le premier tirage n'est jamais rejoué : il n'a pas de passé.
pub fn target_indices(n_draws: usize, contests: usize) -> std::ops::Range<usize> {
    let start = n_draws.saturating_sub(contests).max(1);
    start..n_draws.max(start)
}

/// Seed propre à un concours : décalé du numéro de concours, sauf en mode horloge.
pub fn contest_seed(base: u64, contest: u32) -> u64 {
    if base == 0 { 0 } else { base.wrapping_add(contest as u64) }
}

/// Rejoue chaque concours cible avec uniquement les tirages qui le précèdent.
/// `draws` va du plus ancien au plus récent.
pub fn run_backtest(
    draws: &[Draw],
    params: &EngineParams,
    contests: usize,
    history_window: usize,
    progress: Option<&ProgressBar>,
) -> Result<BacktestSummary> {
    let targets = target_indices(draws.len(), contests);
    if targets.is_empty() {
        bail!("Pas assez de tirages pour un backtest ({} en base)", draws.len());
    }
    debug!("backtest sur {} concours", targets.len());

    let cancel = CancellationToken::new();
    let rows = targets
        .into_par_iter()
        .map(|t| -> Result<ContestResult> {
            let target = &draws[t];
            let history = recent(&draws[..t], history_window);
            let mut contest_params = params.clone();
            contest_params.seed = contest_seed(params.seed, target.contest);

            let result = generate(history, &contest_params, &cancel);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            let predictions = match result {
                Ok(p) => p,
                Err(e) => {
                    // les autres concours s'arrêtent au prochain point de contrôle
                    cancel.cancel();
                    return Err(e).with_context(|| format!("Concours {}", target.contest));
                }
            };
            let outcome = score_outcome(&predictions.candidates, target.numbers());
            Ok(ContestResult { contest: target.contest, predictions, outcome })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BacktestSummary::from_rows(rows, params.game.pick_count))
}

/// Identifiant d'exécution horodaté.
pub fn new_run_id() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

pub fn persist_backtest(
    conn: &Connection,
    run_id: &str,
    params: &EngineParams,
    summary: &BacktestSummary,
) -> Result<()> {
    let params_json = serde_json::to_string(params)?;
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    for row in &summary.rows {
        let record = BacktestRecord {
            run_id: run_id.to_string(),
            contest: row.contest,
            params_json: params_json.clone(),
            predictions_json: serde_json::to_string(&row.predictions)?,
            outcome_json: serde_json::to_string(&row.outcome)?,
        };
        insert_backtest_result(&tx, &record)?;
    }
    tx.commit().context("Échec du commit")?;
    info!("backtest {} enregistré ({} concours)", run_id, summary.rows.len());
    Ok(())
}
