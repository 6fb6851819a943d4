//! The Decision Resolver - majority vote, tie-breaks and feasibility.
//!
//! Every vote in the engine goes through [`DecisionResolver::tally`]:
//! - the unique value with the top count wins
//! - a tie at the top is settled by the configured [`TieBreak`]
//! - no ballots at all is `Undecided`
//!
//! Under insufficient redundancy (`n < 3f + 1`) ties are never broken.
//! A tie there means loyal participants saw genuinely conflicting evidence,
//! and picking a side would only hide the impossibility.

use crate::config::TieBreak;
use crate::participant::Participant;
use agreement_env::{Decision, Value};
use std::collections::BTreeMap;

/// Returns true if `n` participants can tolerate `f` Byzantine faults.
pub fn check_feasibility(n: usize, f: usize) -> bool {
    n >= f.saturating_mul(3).saturating_add(1)
}

/// Applies the vote for one run.
#[derive(Debug, Clone)]
pub struct DecisionResolver<V> {
    tie_break: TieBreak,
    announced: Option<V>,
    feasible: bool,
}

impl<V: Value> DecisionResolver<V> {
    /// Creates a resolver.
    ///
    /// `announced` is the commander's announced value, used by
    /// `TieBreak::PreferCommander`.
    pub fn new(tie_break: TieBreak, announced: Option<V>, feasible: bool) -> Self {
        Self {
            tie_break,
            announced,
            feasible,
        }
    }

    /// Returns the effective tie-break rule (`Strict` when infeasible).
    pub fn tie_break(&self) -> TieBreak {
        if self.feasible {
            self.tie_break
        } else {
            TieBreak::Strict
        }
    }

    /// Resolves `participant` from the values it received in the final round.
    ///
    /// The participant's own best-known value counts as one ballot next to
    /// the received ones.
    pub fn resolve<'v, I>(
        &self,
        participant: &'v Participant<V>,
        final_round_values: I,
    ) -> Decision<V>
    where
        I: IntoIterator<Item = &'v V>,
    {
        let ballots = participant
            .current()
            .into_iter()
            .chain(final_round_values)
            .map(Some);
        self.tally(ballots)
    }

    /// Votes over `ballots`, where `None` is an explicit "nothing received"
    /// ballot that competes like any value.
    pub fn tally<'v, I>(&self, ballots: I) -> Decision<V>
    where
        I: IntoIterator<Item = Option<&'v V>>,
    {
        let mut counts: BTreeMap<Option<&V>, usize> = BTreeMap::new();
        for ballot in ballots {
            *counts.entry(ballot).or_insert(0) += 1;
        }

        let Some(top) = counts.values().copied().max() else {
            return Decision::Undecided;
        };

        let leaders: Vec<Option<&V>> = counts
            .iter()
            .filter(|(_, count)| **count == top)
            .map(|(ballot, _)| *ballot)
            .collect();

        match leaders.as_slice() {
            [winner] => Decision::from(winner.cloned()),
            _ => self.break_tie(&leaders),
        }
    }

    fn break_tie(&self, leaders: &[Option<&V>]) -> Decision<V> {
        let smallest = || Decision::from(leaders.iter().find_map(|ballot| *ballot).cloned());

        match self.tie_break() {
            TieBreak::Strict => Decision::Undecided,
            TieBreak::Smallest => smallest(),
            TieBreak::PreferCommander => match &self.announced {
                Some(announced) if leaders.contains(&Some(announced)) => {
                    Decision::Value(announced.clone())
                }
                _ => smallest(),
            },
        }
    }
}

/// The single value all loyal participants agreed on.
///
/// `Undecided` if any loyal participant is undecided or two of them differ.
pub fn consensus<V: Value>(participants: &[Participant<V>]) -> Decision<V> {
    let mut agreed: Option<&V> = None;

    for participant in participants.iter().filter(|p| p.is_loyal()) {
        let Some(Decision::Value(value)) = participant.decision() else {
            return Decision::Undecided;
        };

        match agreed {
            None => agreed = Some(value),
            Some(previous) if previous == value => {}
            Some(_) => return Decision::Undecided,
        }
    }

    Decision::from(agreed.cloned())
}
