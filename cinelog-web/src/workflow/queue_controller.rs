//! Batch queue controller
//!
//! Drives the title at the head of the pending queue through disambiguation,
//! one call per step, and turns the drained queue into a confirmation set.
//! State goes in and comes back out of every call; nothing is held between
//! requests.
//!
//! Queue only ever shrinks and the accumulator only ever grows. Finalize
//! consumes both, so a finalized batch cannot be advanced again.

use cinelog_common::Candidate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::detail_fetcher::DetailFetcher;
use super::disambiguation::{DisambiguationWorkflow, TitleOutcome, TitleStep};
use super::resolver::CandidateResolver;
use crate::models::{
    BatchState, ConfirmationEntry, Notice, PendingConfirmationSet, Selection, SelectionAccumulator,
    UserInput,
};
use crate::services::MetadataSource;

/// What the caller should do after one `advance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// The head title was decided; advance again for the next one
    ContinueToNextTitle,
    /// The head title needs the user to pick a candidate
    PresentChoice {
        title: String,
        candidates: Vec<Candidate>,
    },
    /// The queue is empty; the batch is ready for confirmation
    Finalize(PendingConfirmationSet),
}

/// Result of one controller step
#[derive(Debug, Clone)]
pub struct Advance {
    pub state: BatchState,
    pub action: NextAction,
    pub notices: Vec<Notice>,
}

/// Where a batch stands once it cannot progress without the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    AwaitingChoice {
        state: BatchState,
        title: String,
        candidates: Vec<Candidate>,
    },
    Finalized(PendingConfirmationSet),
}

/// Result of driving a batch as far as it will go
#[derive(Debug, Clone)]
pub struct Drive {
    pub step: BatchStep,
    pub notices: Vec<Notice>,
}

#[derive(Clone)]
pub struct BatchController {
    workflow: DisambiguationWorkflow,
    fetcher: DetailFetcher,
}

impl BatchController {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            workflow: DisambiguationWorkflow::new(CandidateResolver::new(source.clone())),
            fetcher: DetailFetcher::new(source),
        }
    }

    pub fn fetcher(&self) -> &DetailFetcher {
        &self.fetcher
    }

    /// Take one step on the head title
    ///
    /// `input` only applies when the head title is awaiting a choice. A head
    /// that has not been searched yet ignores it.
    pub async fn advance(&self, mut state: BatchState, input: Option<UserInput>) -> Advance {
        let mut notices = Vec::new();

        let Some(title) = state.queue.head().map(str::to_string) else {
            let set = self.finalize(std::mem::take(&mut state.accumulator)).await;
            return Advance {
                state: BatchState::default(),
                action: NextAction::Finalize(set),
                notices,
            };
        };

        let step = match (state.awaiting_choice.take(), input) {
            (Some(candidates), Some(input)) => DisambiguationWorkflow::decide(candidates, input),
            (Some(candidates), None) => TitleStep::AwaitingUserChoice {
                candidates,
                notice: None,
            },
            (None, input) => {
                if input.is_some() {
                    debug!(title = %title, "Ignoring input for a title that has not been searched");
                }
                self.workflow.search(&title).await
            }
        };

        let action = match step {
            TitleStep::Decided(outcome) => {
                match &outcome {
                    TitleOutcome::NotFound => {
                        warn!(title = %title, "No candidates found, dropping title");
                        notices.push(Notice::warning(format!("Could not find '{}' on TMDb.", title)));
                    }
                    TitleOutcome::UserRejected => {
                        info!(title = %title, "Title rejected by user");
                    }
                    TitleOutcome::AutoResolved(_) | TitleOutcome::UserSelected(_) => {}
                }

                if let Some(id) = outcome.selected_id() {
                    debug!(title = %title, id = %id, "Title resolved");
                    state.accumulator.push(Selection {
                        query_title: title.clone(),
                        id: id.clone(),
                    });
                }
                state.retire_head();
                NextAction::ContinueToNextTitle
            }
            TitleStep::AwaitingUserChoice { candidates, notice } => {
                notices.extend(notice);
                state.awaiting_choice = Some(candidates.clone());
                NextAction::PresentChoice { title, candidates }
            }
        };

        Advance {
            state,
            action,
            notices,
        }
    }

    /// Advance until the user must choose or the batch finalizes
    ///
    /// `input` is consumed by the first step only.
    pub async fn drive(&self, mut state: BatchState, input: Option<UserInput>) -> Drive {
        let mut input = input;
        let mut notices = Vec::new();

        loop {
            let advance = self.advance(state, input.take()).await;
            notices.extend(advance.notices);

            match advance.action {
                NextAction::ContinueToNextTitle => state = advance.state,
                NextAction::PresentChoice { title, candidates } => {
                    return Drive {
                        step: BatchStep::AwaitingChoice {
                            state: advance.state,
                            title,
                            candidates,
                        },
                        notices,
                    };
                }
                NextAction::Finalize(set) => {
                    return Drive {
                        step: BatchStep::Finalized(set),
                        notices,
                    };
                }
            }
        }
    }

    /// Expand every accumulated id into a full record
    ///
    /// Ids whose details cannot be fetched are dropped.
    async fn finalize(&self, accumulator: SelectionAccumulator) -> PendingConfirmationSet {
        let mut entries = Vec::with_capacity(accumulator.len());

        for selection in accumulator.into_inner() {
            match self.fetcher.fetch_details(&selection.id).await {
                Some(record) => entries.push(ConfirmationEntry {
                    query_title: selection.query_title,
                    record,
                }),
                None => {
                    warn!(id = %selection.id, title = %selection.query_title, "Dropping selection without details");
                }
            }
        }

        info!(count = entries.len(), "Batch finalized");
        PendingConfirmationSet::new(entries)
    }
}
