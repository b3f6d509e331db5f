//! Per-title disambiguation
//!
//! One title moves through:
//!
//! ```text
//! Searching ──0 candidates──▶ NotFound
//!           ──1 candidate───▶ AutoResolved
//!           ──2+ candidates─▶ AwaitingUserChoice ──reject──▶ UserRejected
//!                                                 ──select──▶ UserSelected
//!                                                 ──nothing─▶ AwaitingUserChoice
//! ```
//!
//! Every state except `AwaitingUserChoice` is terminal for the title.

use cinelog_common::{Candidate, MovieId};
use tracing::debug;

use super::resolver::CandidateResolver;
use crate::models::{Notice, UserInput};

/// Result of searching for one title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    AutoResolved(Candidate),
    Choice(Vec<Candidate>),
}

impl Resolution {
    pub fn from_candidates(mut candidates: Vec<Candidate>) -> Self {
        match candidates.len() {
            0 => Resolution::NotFound,
            1 => Resolution::AutoResolved(candidates.remove(0)),
            _ => Resolution::Choice(candidates),
        }
    }
}

/// Terminal outcome for one title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    NotFound,
    AutoResolved(Candidate),
    UserSelected(MovieId),
    UserRejected,
}

impl TitleOutcome {
    /// Id to accumulate, if the outcome selected one
    pub fn selected_id(&self) -> Option<&MovieId> {
        match self {
            TitleOutcome::AutoResolved(candidate) => Some(&candidate.id),
            TitleOutcome::UserSelected(id) => Some(id),
            TitleOutcome::NotFound | TitleOutcome::UserRejected => None,
        }
    }
}

/// Where a title stands after one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleStep {
    Decided(TitleOutcome),
    AwaitingUserChoice {
        candidates: Vec<Candidate>,
        notice: Option<Notice>,
    },
}

#[derive(Clone)]
pub struct DisambiguationWorkflow {
    resolver: CandidateResolver,
}

impl DisambiguationWorkflow {
    pub fn new(resolver: CandidateResolver) -> Self {
        Self { resolver }
    }

    /// Searching: look the title up and branch on the candidate count
    pub async fn search(&self, title: &str) -> TitleStep {
        let resolution = Resolution::from_candidates(self.resolver.resolve(title).await);
        debug!(title = %title, resolution = ?resolution, "Title searched");

        match resolution {
            Resolution::NotFound => TitleStep::Decided(TitleOutcome::NotFound),
            Resolution::AutoResolved(candidate) => {
                TitleStep::Decided(TitleOutcome::AutoResolved(candidate))
            }
            Resolution::Choice(candidates) => TitleStep::AwaitingUserChoice {
                candidates,
                notice: None,
            },
        }
    }

    /// AwaitingUserChoice: apply the user's answer
    ///
    /// A selection that is not among the presented candidates counts as no
    /// selection.
    pub fn decide(candidates: Vec<Candidate>, input: UserInput) -> TitleStep {
        match input {
            UserInput::Reject => TitleStep::Decided(TitleOutcome::UserRejected),
            UserInput::Select(id) if candidates.iter().any(|c| c.id == id) => {
                TitleStep::Decided(TitleOutcome::UserSelected(id))
            }
            UserInput::Select(id) => TitleStep::AwaitingUserChoice {
                candidates,
                notice: Some(Notice::error(format!(
                    "Movie {} is not one of the listed matches.",
                    id
                ))),
            },
            UserInput::NoSelection => TitleStep::AwaitingUserChoice {
                candidates,
                notice: Some(Notice::error("Please select a movie to add.")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, title: &str) -> Candidate {
        Candidate {
            id: MovieId::from(id),
            title: title.to_string(),
            release_year: String::new(),
        }
    }

    fn two_candidates() -> Vec<Candidate> {
        vec![candidate(603, "The Matrix"), candidate(604, "The Matrix Reloaded")]
    }

    #[test]
    fn test_resolution_branches_on_count() {
        assert_eq!(Resolution::from_candidates(Vec::new()), Resolution::NotFound);
        assert_eq!(
            Resolution::from_candidates(vec![candidate(1, "Heat")]),
            Resolution::AutoResolved(candidate(1, "Heat"))
        );
        assert!(matches!(
            Resolution::from_candidates(two_candidates()),
            Resolution::Choice(c) if c.len() == 2
        ));
    }

    #[test]
    fn test_decide_reject() {
        let step = DisambiguationWorkflow::decide(two_candidates(), UserInput::Reject);
        assert_eq!(step, TitleStep::Decided(TitleOutcome::UserRejected));
    }

    #[test]
    fn test_decide_select_listed_candidate() {
        let step = DisambiguationWorkflow::decide(two_candidates(), UserInput::Select(MovieId::from(604u64)));
        assert_eq!(step, TitleStep::Decided(TitleOutcome::UserSelected(MovieId::from(604u64))));
    }

    #[test]
    fn test_decide_without_selection_stays_awaiting() {
        let step = DisambiguationWorkflow::decide(two_candidates(), UserInput::NoSelection);
        match step {
            TitleStep::AwaitingUserChoice { candidates, notice } => {
                assert_eq!(candidates, two_candidates());
                assert_eq!(notice.unwrap().message, "Please select a movie to add.");
            }
            other => panic!("expected AwaitingUserChoice, got {:?}", other),
        }
    }

    #[test]
    fn test_decide_unknown_id_stays_awaiting() {
        let step = DisambiguationWorkflow::decide(two_candidates(), UserInput::Select(MovieId::from(1u64)));
        assert!(matches!(step, TitleStep::AwaitingUserChoice { notice: Some(_), .. }));
    }

    #[test]
    fn test_selected_id() {
        assert_eq!(
            TitleOutcome::AutoResolved(candidate(1, "Heat")).selected_id(),
            Some(&MovieId::from(1u64))
        );
        assert!(TitleOutcome::NotFound.selected_id().is_none());
        assert!(TitleOutcome::UserRejected.selected_id().is_none());
    }
}
