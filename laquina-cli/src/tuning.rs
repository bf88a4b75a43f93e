use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Args;

use laquina_engine::EngineParams;

/// Réglages du moteur exposés en options. Une option absente garde la valeur
/// du fichier `--params` (ou la valeur par défaut).
#[derive(Debug, Clone, Default, Args)]
pub struct TuningArgs {
    /// Fichier JSON de paramètres de base
    #[arg(long)]
    pub params: Option<std::path::PathBuf>,

    /// Poids de co-occurrence
    #[arg(long)]
    pub alpha: Option<f64>,
    /// Poids de la probabilité marginale
    #[arg(long)]
    pub beta: Option<f64>,
    /// Poids positionnel
    #[arg(long)]
    pub gamma: Option<f64>,
    /// Pénalité par numéro en trop dans une même dizaine
    #[arg(long)]
    pub cluster_penalty: Option<f64>,
    /// Décroissance de récence
    #[arg(long)]
    pub lambda: Option<f64>,
    /// Multiplicateur des numéros froids
    #[arg(long)]
    pub hot_cold_boost: Option<f64>,
    /// Tirages considérés comme récents
    #[arg(long)]
    pub hot_window: Option<usize>,
    /// Tirages retenus pour les statistiques (0 = tous)
    #[arg(long)]
    pub window: Option<usize>,
    /// Tirages retenus pour la co-occurrence (0 = tous)
    #[arg(long)]
    pub cooccurrence_window: Option<usize>,
    /// Lissage additif de la table conditionnelle
    #[arg(long)]
    pub smoothing: Option<f64>,
    /// Facteur de suréchantillonnage
    #[arg(long)]
    pub cands_mult: Option<usize>,
    /// Itérations de hill-climbing par candidat
    #[arg(long)]
    pub hill_iter: Option<usize>,
    /// Générations de l'évolution
    #[arg(long)]
    pub generations: Option<usize>,
    /// Élites conservées à chaque génération
    #[arg(long)]
    pub elite_count: Option<usize>,
    /// Probabilité de mutation
    #[arg(long)]
    pub mutate_prob: Option<f64>,
    /// Active le filtre somme / parité / consécutifs
    #[arg(long)]
    pub smart_filters: bool,
    /// Nombre de grilles
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
    /// Seed (0 = horloge)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Seed du jour (AAAAMMJJ), ignoré si --seed est donné
    #[arg(long)]
    pub daily: bool,
}

/// Seed déterministe basé sur la date du jour (AAAAMMJJ).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

pub fn load_params(path: &Path) -> Result<EngineParams> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let params: EngineParams = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    Ok(params)
}

impl TuningArgs {
    /// Paramètres effectifs : fichier de base puis options.
    pub fn resolve(&self) -> Result<EngineParams> {
        let mut params = match &self.params {
            Some(path) => load_params(path)?,
            None => EngineParams::default(),
        };
        self.apply(&mut params);
        params.validate().context("Paramètres invalides")?;
        Ok(params)
    }

    pub fn apply(&self, params: &mut EngineParams) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field { params.$field = v; })*
            };
        }
        set!(
            alpha, beta, gamma, cluster_penalty, lambda, hot_cold_boost, hot_window, window,
            cooccurrence_window, smoothing, cands_mult, hill_iter, generations, elite_count,
            mutate_prob
        );
        if self.smart_filters {
            params.use_smart_filters = true;
        }
        if let Some(count) = self.count {
            params.num_predictions = count;
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        } else if self.daily {
            params.seed = date_seed();
        }
    }
}
