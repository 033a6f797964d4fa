pub use crate::config::*;

use snafu::ensure;
use std::collections::HashSet;

/// A builder for assembling the rows of a dataset, one district at a time.
///
/// It checks each row as it comes, which makes it the natural target for file readers:
/// the error points at the first faulty district.
///
/// ```
/// pub use election_map::builder::Builder;
/// # use election_map::MapError;
///
/// let mut builder = Builder::new()
///     .candidates(&["Bergeron".to_string(), "Coderre".to_string()])?;
///
/// builder.add_row("1-Nord", &[("Coderre".to_string(), 80), ("Bergeron".to_string(), 120)])?;
///
/// assert_eq!(builder.rows()[0].winner(), Some("Bergeron"));
/// # Ok::<(), MapError>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _rows: Vec<Row>,
    pub(crate) _districts: HashSet<String>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares the candidates. Without it, the first row sets the candidates.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, MapError> {
        check_names(cands, "the candidate list")?;
        Ok(Builder {
            _candidates: Some(cands.to_vec()),
            _rows: Vec::new(),
            _districts: HashSet::new(),
        })
    }

    /// Adds the results of one district.
    pub fn add_row(&mut self, district: &str, votes: &[(String, u64)]) -> Result<(), MapError> {
        self.add_row_2(Row {
            district: district.to_string(),
            votes: votes.to_vec(),
            winner: None,
        })
    }

    /// Adds the results of one district along with the winner declared by the source.
    pub fn add_row_with_winner(
        &mut self,
        district: &str,
        votes: &[(String, u64)],
        winner: &str,
    ) -> Result<(), MapError> {
        self.add_row_2(Row {
            district: district.to_string(),
            votes: votes.to_vec(),
            winner: Some(winner.to_string()),
        })
    }

    pub fn add_row_2(&mut self, row: Row) -> Result<(), MapError> {
        ensure!(
            !row.district.is_empty(),
            MalformedDatasetSnafu {
                reason: "empty district identifier",
            }
        );
        ensure!(
            !self._districts.contains(&row.district),
            MalformedDatasetSnafu {
                reason: format!("district {} appears more than once", row.district),
            }
        );
        let names: Vec<String> = row.votes.iter().map(|(name, _)| name.clone()).collect();
        let context = format!("district {}", row.district);
        check_names(&names, &context)?;

        let expected = match &self._candidates {
            Some(cands) => cands.clone(),
            None => {
                self._candidates = Some(names.clone());
                names.clone()
            }
        };
        ensure!(
            names.len() == expected.len() && names.iter().all(|n| expected.contains(n)),
            MalformedDatasetSnafu {
                reason: format!(
                    "{} has candidates {:?}, expected {:?}",
                    context, names, expected
                ),
            }
        );
        if let Some(w) = row.winner.as_deref() {
            ensure!(
                expected.iter().any(|c| c == w),
                MalformedDatasetSnafu {
                    reason: format!("{} is won by {}, who is not a candidate", context, w),
                }
            );
        }

        self._districts.insert(row.district.clone());
        self._rows.push(row);
        Ok(())
    }

    pub fn candidate_names(&self) -> Option<&[String]> {
        self._candidates.as_deref()
    }

    pub fn rows(&self) -> &[Row] {
        &self._rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self._rows
    }
}

fn check_names(names: &[String], context: &str) -> Result<(), MapError> {
    ensure!(
        !names.is_empty(),
        MalformedDatasetSnafu {
            reason: format!("{} has no candidates", context),
        }
    );
    ensure!(
        names.iter().all(|n| !n.is_empty()),
        MalformedDatasetSnafu {
            reason: format!("{} has an unnamed candidate", context),
        }
    );
    let unique: HashSet<&String> = names.iter().collect();
    ensure!(
        unique.len() == names.len(),
        MalformedDatasetSnafu {
            reason: format!("{} lists a candidate twice", context),
        }
    );
    Ok(())
}
