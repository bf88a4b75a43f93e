use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};

/// Domaine du jeu : `pick_count` numéros distincts parmi `1..=max_num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub max_num: u8,
    pub pick_count: usize,
}

impl Game {
    pub const QUINA: Game = Game { max_num: 80, pick_count: 5 };

    pub fn numbers(&self) -> impl Iterator<Item = u8> {
        1..=self.max_num
    }

    /// Taille des tables indexées par numéro (l'index 0 n'est pas utilisé).
    pub fn table_len(&self) -> usize {
        self.max_num as usize + 1
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::QUINA
    }
}

/// Bornes du filtre topologique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub sum_min: u32,
    pub sum_max: u32,
    pub max_adjacent: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sum_min: 120,
            sum_max: 280,
            max_adjacent: 2,
        }
    }
}

/// Constantes de l'extension gloutonne.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    /// Probabilité de tirer le numéro suivant à la roulette pondérée.
    pub weighted_fallback: f64,
    /// Probabilité de tirer le numéro suivant uniformément.
    pub uniform_fallback: f64,
    /// Exposant appliqué à la probabilité marginale dans le score glouton.
    pub marginal_tilt: f64,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            weighted_fallback: 0.08,
            uniform_fallback: 0.02,
            marginal_tilt: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub game: Game,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub cluster_penalty: f64,
    pub lambda: f64,
    pub hot_cold_boost: f64,
    pub hot_window: usize,
    /// Tirages retenus pour fréquences, marginales et pondération (0 = tous).
    pub window: usize,
    /// Tirages retenus pour la table conditionnelle (0 = tous).
    pub cooccurrence_window: usize,
    pub smoothing: f64,
    pub cands_mult: usize,
    pub hill_iter: usize,
    pub generations: usize,
    pub elite_count: usize,
    pub mutate_prob: f64,
    pub use_smart_filters: bool,
    pub filter: FilterConfig,
    pub greedy: GreedyConfig,
    pub num_predictions: usize,
    /// 0 = seed frais dérivé de l'horloge.
    pub seed: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            game: Game::QUINA,
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.5,
            cluster_penalty: 0.15,
            lambda: 0.02,
            hot_cold_boost: 1.2,
            hot_window: 10,
            window: 0,
            cooccurrence_window: 200,
            smoothing: 1.0,
            cands_mult: 20,
            hill_iter: 150,
            generations: 40,
            elite_count: 4,
            mutate_prob: 0.2,
            use_smart_filters: false,
            filter: FilterConfig::default(),
            greedy: GreedyConfig::default(),
            num_predictions: 10,
            seed: 0,
        }
    }
}

/// Multiplicateur de suréchantillonnage quand le filtre est actif.
pub const FILTER_OVERSAMPLE: usize = 5;

/// Plafond du nombre de candidats bruts par appel.
pub const MAX_RAW_CANDIDATES: usize = 1_000_000;

impl EngineParams {
    fn filter_mult(&self) -> usize {
        if self.use_smart_filters { FILTER_OVERSAMPLE } else { 1 }
    }

    /// Nombre de candidats bruts à générer. Borné par `validate`.
    pub fn oversample(&self) -> usize {
        self.num_predictions
            .saturating_mul(self.cands_mult)
            .saturating_mul(self.filter_mult())
    }

    /// Vérifie les paramètres. Appelé avant toute consommation d'aléa.
    pub fn validate(&self) -> Result<()> {
        let game = self.game;
        if game.pick_count == 0 {
            return Err(invalid("pick_count doit être > 0"));
        }
        if (game.max_num as usize) < game.pick_count {
            return Err(invalid(format!(
                "max_num ({}) inférieur à pick_count ({})",
                game.max_num, game.pick_count
            )));
        }
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(invalid(format!("lissage {} non positif", self.smoothing)));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(invalid(format!("lambda {} invalide", self.lambda)));
        }
        for (name, w) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("cluster_penalty", self.cluster_penalty),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(invalid(format!("poids {name} = {w} invalide")));
            }
        }
        if !self.hot_cold_boost.is_finite() || self.hot_cold_boost <= 0.0 {
            return Err(invalid(format!("hot_cold_boost {} non positif", self.hot_cold_boost)));
        }
        if !(0.0..=1.0).contains(&self.mutate_prob) {
            return Err(invalid(format!("mutate_prob {} hors de [0, 1]", self.mutate_prob)));
        }
        let g = self.greedy;
        if !(0.0..=1.0).contains(&g.weighted_fallback)
            || !(0.0..=1.0).contains(&g.uniform_fallback)
            || g.weighted_fallback + g.uniform_fallback > 1.0
        {
            return Err(invalid("probabilités de repli gloutonnes hors de [0, 1]"));
        }
        if !g.marginal_tilt.is_finite() || g.marginal_tilt < 0.0 {
            return Err(invalid(format!("marginal_tilt {} invalide", g.marginal_tilt)));
        }
        if self.filter.sum_min > self.filter.sum_max {
            return Err(invalid(format!(
                "bornes de somme inversées ({} > {})",
                self.filter.sum_min, self.filter.sum_max
            )));
        }
        if self.cands_mult == 0 {
            return Err(invalid("cands_mult doit être > 0"));
        }
        if self.elite_count == 0 {
            return Err(invalid("elite_count doit être > 0"));
        }
        let raw = self
            .num_predictions
            .checked_mul(self.cands_mult)
            .and_then(|v| v.checked_mul(self.filter_mult()));
        match raw {
            Some(n) if n <= MAX_RAW_CANDIDATES => {}
            _ => {
                return Err(invalid(format!(
                    "suréchantillonnage trop grand ({} grilles × {} × {}, plafond {})",
                    self.num_predictions,
                    self.cands_mult,
                    self.filter_mult(),
                    MAX_RAW_CANDIDATES
                )));
            }
        }
        Ok(())
    }

    /// Applique un paramètre nommé. Réservé à l'expansion des balayages,
    /// qui manipulent des grilles clé/valeur.
    pub fn set_named(&mut self, name: &str, value: f64) -> Result<()> {
        let as_count = |v: f64| -> Result<usize> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(invalid(format!("{name} attend un entier positif, reçu {v}")))
            }
        };
        match name {
            "alpha" => self.alpha = value,
            "beta" => self.beta = value,
            "gamma" => self.gamma = value,
            "cluster_penalty" => self.cluster_penalty = value,
            "lambda" => self.lambda = value,
            "hot_cold_boost" => self.hot_cold_boost = value,
            "hot_window" => self.hot_window = as_count(value)?,
            "window" => self.window = as_count(value)?,
            "cooccurrence_window" => self.cooccurrence_window = as_count(value)?,
            "smoothing" => self.smoothing = value,
            "cands_mult" => self.cands_mult = as_count(value)?,
            "hill_iter" => self.hill_iter = as_count(value)?,
            "generations" => self.generations = as_count(value)?,
            "elite_count" => self.elite_count = as_count(value)?,
            "mutate_prob" => self.mutate_prob = value,
            "use_smart_filters" => self.use_smart_filters = value != 0.0,
            "sum_min" => self.filter.sum_min = as_count(value)? as u32,
            "sum_max" => self.filter.sum_max = as_count(value)? as u32,
            "max_adjacent" => self.filter.max_adjacent = as_count(value)?,
            "weighted_fallback" => self.greedy.weighted_fallback = value,
            "uniform_fallback" => self.greedy.uniform_fallback = value,
            "marginal_tilt" => self.greedy.marginal_tilt = value,
            "num_predictions" => self.num_predictions = as_count(value)?,
            _ => return Err(invalid(format!("paramètre inconnu : {name}"))),
        }
        Ok(())
    }
}
