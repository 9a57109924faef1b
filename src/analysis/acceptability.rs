use serde::{Deserialize, Serialize};

use crate::{Error, Ranking};

/// Scaling applied to a rank acceptability matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acceptability {
    /// Share of rankings placing the alternative at the position.
    #[default]
    Share,
    /// Shares divided by the largest share at the same position.
    PerPosition,
    /// Shares divided by the largest share of the same alternative.
    PerAlternative,
}

/// Rank acceptability matrix indexed `[position][alternative]`.
pub fn rank_acceptability(
    rankings: &[Ranking],
    scaling: Acceptability,
) -> Result<Vec<Vec<f64>>, Error> {
    let first = rankings
        .first()
        .ok_or_else(|| Error::invalid("at least one ranking is required"))?;
    let m = first.len();
    if let Some(index) = rankings.iter().position(|r| r.len() != m) {
        return Err(Error::RankingLengthMismatch {
            index,
            expected: m,
            found: rankings[index].len(),
        });
    }

    let mut shares = vec![vec![0.0; m]; m];
    let share = 1.0 / rankings.len() as f64;
    for ranking in rankings {
        for (position, &alternative) in ranking.order().iter().enumerate() {
            shares[position][alternative] += share;
        }
    }

    // Every position and every alternative is occupied at least once, so maxima are positive.
    match scaling {
        Acceptability::Share => {}
        Acceptability::PerPosition => {
            for row in &mut shares {
                let max = row.iter().copied().fold(0.0, f64::max);
                row.iter_mut().for_each(|s| *s /= max);
            }
        }
        Acceptability::PerAlternative => {
            for alternative in 0..m {
                let max = shares.iter().map(|row| row[alternative]).fold(0.0, f64::max);
                shares.iter_mut().for_each(|row| row[alternative] /= max);
            }
        }
    }
    Ok(shares)
}
