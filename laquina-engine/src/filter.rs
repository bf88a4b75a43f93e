use crate::params::FilterConfig;

/// Validité topologique d'une combinaison triée : somme dans
/// `[sum_min, sum_max]`, au moins un pair et un impair, au plus
/// `max_adjacent` paires de numéros consécutifs.
pub fn passes(numbers: &[u8], config: &FilterConfig) -> bool {
    let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
    if sum < config.sum_min || sum > config.sum_max {
        return false;
    }

    let odd = numbers.iter().filter(|&&n| n % 2 == 1).count();
    if odd == 0 || odd == numbers.len() {
        return false;
    }

    adjacent_pairs(numbers) <= config.max_adjacent
}

pub fn adjacent_pairs(numbers: &[u8]) -> usize {
    numbers.windows(2).filter(|w| w[1] == w[0] + 1).count()
}
