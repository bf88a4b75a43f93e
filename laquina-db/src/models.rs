use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const MAX_NUM: u8 = 80;
pub const PICK_COUNT: usize = 5;

/// Tirage tel que publié. `balls` garde l'ordre de sortie, pas l'ordre croissant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub contest: u32,
    pub date: String,
    pub balls: [u8; PICK_COUNT],
}

impl Draw {
    pub fn numbers(&self) -> &[u8] {
        &self.balls
    }

    pub fn sorted_numbers(&self) -> [u8; PICK_COUNT] {
        let mut balls = self.balls;
        balls.sort_unstable();
        balls
    }
}

impl AsRef<[u8]> for Draw {
    fn as_ref(&self) -> &[u8] {
        &self.balls
    }
}

/// Ligne de résultat d'un backtest, stockée telle quelle (blobs JSON opaques).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestRecord {
    pub run_id: String,
    pub contest: u32,
    pub params_json: String,
    pub predictions_json: String,
    pub outcome_json: String,
}

pub fn validate_draw(balls: &[u8]) -> Result<()> {
    if balls.len() != PICK_COUNT {
        bail!("{} numéros au lieu de {}", balls.len(), PICK_COUNT);
    }
    for &b in balls {
        if b < 1 || b > MAX_NUM {
            bail!("Numéro {} hors limites (1-{})", b, MAX_NUM);
        }
    }
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            if balls[i] == balls[j] {
                bail!("Numéro en double : {}", balls[i]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5]).is_ok());
        assert!(validate_draw(&[80, 79, 41, 12, 7]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 81]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate() {
        assert!(validate_draw(&[1, 1, 3, 4, 5]).is_err());
    }

    #[test]
    fn test_validate_draw_wrong_size() {
        assert!(validate_draw(&[1, 2, 3, 4]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_draw_keeps_stored_order() {
        let draw = Draw { contest: 6500, date: "2024-07-01".to_string(), balls: [44, 3, 71, 18, 9] };
        assert_eq!(draw.numbers(), &[44, 3, 71, 18, 9]);
        assert_eq!(draw.as_ref(), &[44, 3, 71, 18, 9]);
        assert_eq!(draw.sorted_numbers(), [3, 9, 18, 44, 71]);
    }
}
