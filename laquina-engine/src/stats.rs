use crate::params::{EngineParams, Game};

/// Tables dérivées de l'historique pour un appel du moteur.
///
/// Toutes les tables sont indexées par numéro (`table[n]`, index 0 inutilisé)
/// et parcourues dans l'ordre croissant du domaine.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub game: Game,
    /// Nombre de tirages dans la fenêtre des fréquences.
    pub n_draws: usize,
    pub frequency: Vec<u32>,
    /// `positional[slot][n]` : apparitions de `n` à la position `slot` telle que stockée.
    pub positional: Vec<Vec<u32>>,
    pub marginal: Vec<f64>,
    /// `conditional[a][b]` : probabilité lissée de voir `b` sachant `a`.
    pub conditional: Vec<Vec<f64>>,
    /// Tirages écoulés depuis la dernière apparition (longueur de l'historique si jamais vu).
    pub contests_ago: Vec<usize>,
    /// Présent dans la fenêtre chaude.
    pub hot: Vec<bool>,
}

impl Statistics {
    /// `history` va du plus ancien au plus récent.
    pub fn compute<D: AsRef<[u8]>>(history: &[D], params: &EngineParams) -> Self {
        let game = params.game;
        let draws = recent(history, params.window);
        let cooccurrence = recent(history, params.cooccurrence_window);

        Self {
            game,
            n_draws: draws.len(),
            frequency: compute_frequency(draws, game.max_num),
            positional: compute_positional_frequency(draws, game.pick_count, game.max_num),
            marginal: compute_marginal_probability(draws, params.lambda, game),
            conditional: compute_pairwise_conditional(cooccurrence, game.max_num, params.smoothing),
            contests_ago: compute_contests_ago(draws, game.max_num),
            hot: compute_hot(draws, params.hot_window, game.max_num),
        }
    }

    pub fn total_frequency(&self) -> u64 {
        self.frequency.iter().map(|&f| f as u64).sum()
    }
}

/// Les `window` derniers tirages (tous si `window == 0`).
pub fn recent<D>(history: &[D], window: usize) -> &[D] {
    if window == 0 || window >= history.len() {
        history
    } else {
        &history[history.len() - window..]
    }
}

pub fn compute_frequency<D: AsRef<[u8]>>(draws: &[D], max_num: u8) -> Vec<u32> {
    let mut freq = vec![0u32; max_num as usize + 1];
    for draw in draws {
        for &n in draw.as_ref() {
            if (1..=max_num).contains(&n) {
                freq[n as usize] += 1;
            }
        }
    }
    freq
}

pub fn compute_positional_frequency<D: AsRef<[u8]>>(
    draws: &[D],
    positions: usize,
    max_num: u8,
) -> Vec<Vec<u32>> {
    let mut table = vec![vec![0u32; max_num as usize + 1]; positions];
    for draw in draws {
        for (slot, &n) in draw.as_ref().iter().enumerate().take(positions) {
            if (1..=max_num).contains(&n) {
                table[slot][n as usize] += 1;
            }
        }
    }
    table
}

/// Fréquence pondérée par la récence : le tirage `i` (0 = le plus ancien)
/// pèse `exp(-lambda * (D - 1 - i))`. La somme sur le domaine vaut `pick_count`.
/// Historique vide : table nulle.
pub fn compute_marginal_probability<D: AsRef<[u8]>>(draws: &[D], lambda: f64, game: Game) -> Vec<f64> {
    let mut marginal = vec![0.0f64; game.table_len()];
    let d = draws.len();

    for (i, draw) in draws.iter().enumerate() {
        let weight = (-lambda * (d - 1 - i) as f64).exp();
        for &n in draw.as_ref() {
            if (1..=game.max_num).contains(&n) {
                marginal[n as usize] += weight;
            }
        }
    }

    let total: f64 = marginal.iter().sum();
    if total > 0.0 {
        let scale = game.pick_count as f64 / total;
        for m in &mut marginal {
            *m *= scale;
        }
    }
    marginal
}

/// `cond[a][b] = (cooc(a, b) + s) / (freq[a] + s * max_num)`, comptages pris
/// sur les tirages fournis. La diagonale reste à 0.
pub fn compute_pairwise_conditional<D: AsRef<[u8]>>(
    draws: &[D],
    max_num: u8,
    smoothing: f64,
) -> Vec<Vec<f64>> {
    let size = max_num as usize + 1;
    let freq = compute_frequency(draws, max_num);
    let mut cooc = vec![vec![0u32; size]; size];

    for draw in draws {
        let numbers: Vec<usize> = draw
            .as_ref()
            .iter()
            .filter(|&&n| (1..=max_num).contains(&n))
            .map(|&n| n as usize)
            .collect();
        for (i, &a) in numbers.iter().enumerate() {
            for &b in &numbers[i + 1..] {
                cooc[a][b] += 1;
                cooc[b][a] += 1;
            }
        }
    }

    let denom_extra = smoothing * max_num as f64;
    let mut cond = vec![vec![0.0f64; size]; size];
    for a in 1..size {
        let denom = freq[a] as f64 + denom_extra;
        for b in 1..size {
            if a != b {
                cond[a][b] = (cooc[a][b] as f64 + smoothing) / denom;
            }
        }
    }
    cond
}

pub fn compute_contests_ago<D: AsRef<[u8]>>(draws: &[D], max_num: u8) -> Vec<usize> {
    let mut ago = vec![draws.len(); max_num as usize + 1];
    for (t, draw) in draws.iter().rev().enumerate() {
        for &n in draw.as_ref() {
            let idx = n as usize;
            if (1..=max_num).contains(&n) && ago[idx] == draws.len() {
                ago[idx] = t;
            }
        }
    }
    ago
}

pub fn compute_hot<D: AsRef<[u8]>>(draws: &[D], hot_window: usize, max_num: u8) -> Vec<bool> {
    let mut hot = vec![false; max_num as usize + 1];
    if hot_window == 0 {
        return hot;
    }
    for draw in recent(draws, hot_window) {
        for &n in draw.as_ref() {
            if (1..=max_num).contains(&n) {
                hot[n as usize] = true;
            }
        }
    }
    hot
}
