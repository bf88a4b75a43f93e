use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use laquina_db::models::Draw;
use laquina_engine::EngineParams;

use crate::backtest::run_backtest;

/// Description d'un balayage : paramètres de base et valeurs à croiser par nom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSpec {
    pub base: EngineParams,
    pub grid: BTreeMap<String, Vec<f64>>,
    pub max_variations: usize,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            base: EngineParams::default(),
            grid: BTreeMap::new(),
            max_variations: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variation {
    pub overrides: BTreeMap<String, f64>,
    pub params: EngineParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepEntry {
    pub overrides: BTreeMap<String, f64>,
    pub params: EngineParams,
    pub mean_best_hits: f64,
    pub jackpot: usize,
    pub minus_one: usize,
    pub minus_two: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub contests: usize,
    pub evaluated: usize,
    pub failed: usize,
    /// Variations classées, la meilleure en tête.
    pub entries: Vec<SweepEntry>,
}

pub fn load_spec(path: &std::path::Path) -> Result<SweepSpec> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("JSON invalide dans {:?}", path))
}

/// Produit cartésien de la grille, dans l'ordre des clés. Une combinaison
/// refusée par `validate` est écartée ; l'expansion s'arrête à `max_variations`.
pub fn expand(spec: &SweepSpec) -> Result<Vec<Variation>> {
    for (name, values) in &spec.grid {
        if values.is_empty() {
            bail!("Aucune valeur pour le paramètre {}", name);
        }
        spec.base
            .clone()
            .set_named(name, values[0])
            .with_context(|| format!("Paramètre de balayage {}", name))?;
    }

    let keys: Vec<&String> = spec.grid.keys().collect();
    let mut cursor = vec![0usize; keys.len()];
    let mut variations = Vec::new();

    'outer: loop {
        if variations.len() >= spec.max_variations {
            break;
        }

        let mut overrides = BTreeMap::new();
        let mut params = spec.base.clone();
        let mut usable = true;
        for (k, &name) in keys.iter().enumerate() {
            let value = spec.grid[name][cursor[k]];
            overrides.insert(name.clone(), value);
            if let Err(e) = params.set_named(name, value) {
                warn!("variation {:?} ignorée : {}", overrides, e);
                usable = false;
                break;
            }
        }
        if usable {
            match params.validate() {
                Ok(()) => variations.push(Variation { overrides, params }),
                Err(e) => warn!("variation {:?} ignorée : {}", overrides, e),
            }
        }

        // incrément du curseur, dernière clé la plus rapide
        let mut k = keys.len();
        loop {
            if k == 0 {
                break 'outer;
            }
            k -= 1;
            cursor[k] += 1;
            if cursor[k] < spec.grid[keys[k]].len() {
                break;
            }
            cursor[k] = 0;
        }
    }

    Ok(variations)
}

fn compare_entries(a: &SweepEntry, b: &SweepEntry) -> std::cmp::Ordering {
    b.mean_best_hits
        .partial_cmp(&a.mean_best_hits)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b.jackpot.cmp(&a.jackpot))
        .then_with(|| b.minus_one.cmp(&a.minus_one))
        .then_with(|| b.minus_two.cmp(&a.minus_two))
}

/// Backteste chaque variation sur les `contests` derniers concours, en parallèle.
pub fn run_sweep(
    draws: &[Draw],
    variations: &[Variation],
    contests: usize,
    history_window: usize,
) -> Result<SweepReport> {
    if variations.is_empty() {
        bail!("Aucune variation valide à évaluer");
    }

    let pb = ProgressBar::new(variations.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )?
        .progress_chars("=> "),
    );

    let start = std::time::Instant::now();

    let mut entries: Vec<SweepEntry> = variations
        .par_iter()
        .filter_map(|variation| {
            let result = run_backtest(draws, &variation.params, contests, history_window, None);
            pb.inc(1);
            match result {
                Ok(summary) => Some(SweepEntry {
                    overrides: variation.overrides.clone(),
                    params: variation.params.clone(),
                    mean_best_hits: summary.mean_best_hits,
                    jackpot: summary.totals.jackpot,
                    minus_one: summary.totals.minus_one,
                    minus_two: summary.totals.minus_two,
                }),
                Err(e) => {
                    warn!("variation {:?} en échec : {:#}", variation.overrides, e);
                    None
                }
            }
        })
        .collect();

    pb.finish_and_clear();
    let elapsed = start.elapsed().as_secs();
    let failed = variations.len() - entries.len();
    println!(
        "Balayage terminé : {}/{} variations en {}m{:02}s ({} échecs)",
        entries.len(),
        variations.len(),
        elapsed / 60,
        elapsed % 60,
        failed,
    );

    if entries.is_empty() {
        bail!("Toutes les variations ont échoué");
    }
    entries.sort_by(compare_entries);

    Ok(SweepReport {
        contests,
        evaluated: entries.len(),
        failed,
        entries,
    })
}

pub fn save_report(report: &SweepReport, path: &std::path::Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    log::info!("rapport de balayage écrit dans {:?}", path);
    Ok(())
}
