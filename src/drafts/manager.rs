use super::types::{DraftCandidate, DraftStatus, FunctionArgs, FunctionCall, FunctionDraft};
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

/// Owns the list of function drafts and reconciles it against confirmed calls.
///
/// Every mutating operation returns a snapshot: deduplicated by `draft_id`
/// and sorted by similarity score, highest first. Callers never get a live
/// reference to the stored list.
#[derive(Debug, Default)]
pub struct DraftManager {
    drafts: Vec<FunctionDraft>,
}

impl DraftManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a new tentative proposal into the stored drafts
    pub fn submit_draft(&mut self, candidate: DraftCandidate) -> Vec<FunctionDraft> {
        let existing = self
            .drafts
            .iter()
            .position(|d| d.draft_id == candidate.draft_id || d.name == candidate.name);

        match existing {
            None => {
                debug!("New draft {} for {}", candidate.draft_id, candidate.name);
                self.drafts.push(FunctionDraft::from_candidate(
                    candidate,
                    DraftStatus::PendingConfirmation,
                ));
            }
            Some(idx) if self.drafts[idx].status == DraftStatus::ConfirmedByLlm => {
                debug!(
                    "Draft {} revises confirmed {}",
                    candidate.draft_id, candidate.name
                );
                self.drafts[idx] =
                    FunctionDraft::from_candidate(candidate, DraftStatus::AwaitingPotentialUpdate);
            }
            Some(idx) => {
                let stored = &self.drafts[idx];
                if candidate.similarity_score >= stored.similarity_score {
                    // A revision of a confirmed field stays flagged until the
                    // service confirms again.
                    let status = match stored.status {
                        DraftStatus::AwaitingPotentialUpdate => DraftStatus::AwaitingPotentialUpdate,
                        _ => DraftStatus::PendingConfirmation,
                    };
                    self.drafts[idx] = FunctionDraft::from_candidate(candidate, status);
                } else {
                    debug!(
                        "Discarding draft {} for {} (score {:.3} < {:.3})",
                        candidate.draft_id,
                        candidate.name,
                        candidate.similarity_score,
                        stored.similarity_score
                    );
                }
            }
        }

        self.sort_and_dedup();
        self.snapshot()
    }

    /// Apply the authoritative confirmed batch.
    ///
    /// Drafts whose name appears in the batch become confirmed with the
    /// confirmed args. Confirmed calls with no matching draft are stored as
    /// synthesized confirmed drafts so no confirmed data is lost.
    pub fn reconcile_confirmed(&mut self, confirmed: &[FunctionCall]) -> Vec<FunctionDraft> {
        // Last entry wins when the batch names a function twice
        let mut unmatched: Vec<(&str, &FunctionArgs)> = Vec::with_capacity(confirmed.len());
        for call in confirmed {
            match unmatched.iter_mut().find(|(name, _)| *name == call.name) {
                Some(entry) => entry.1 = &call.args,
                None => unmatched.push((call.name.as_str(), &call.args)),
            }
        }

        for draft in self.drafts.iter_mut() {
            if let Some(pos) = unmatched.iter().position(|(name, _)| *name == draft.name) {
                let (_, args) = unmatched.remove(pos);
                draft.status = DraftStatus::ConfirmedByLlm;
                draft.args = args.clone();
            }
        }

        let now = Utc::now().to_rfc3339();
        for (name, args) in unmatched {
            debug!("Synthesizing confirmed draft for {}", name);
            self.drafts.push(FunctionDraft {
                draft_id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                args: args.clone(),
                similarity_score: 1.0,
                status: DraftStatus::ConfirmedByLlm,
                timestamp: now.clone(),
            });
        }

        self.sort_and_dedup();
        self.snapshot()
    }

    /// Remove every draft
    pub fn clear(&mut self) -> Vec<FunctionDraft> {
        self.drafts.clear();
        Vec::new()
    }

    /// Remove the drafts matching `predicate`, keeping the rest
    pub fn clear_where<F>(&mut self, predicate: F) -> Vec<FunctionDraft>
    where
        F: Fn(&FunctionDraft) -> bool,
    {
        self.drafts.retain(|d| !predicate(d));
        self.snapshot()
    }

    pub fn snapshot(&self) -> Vec<FunctionDraft> {
        self.drafts.clone()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// One entry per draft id (the latest value, at the earliest position),
    /// then highest score first. The sort is stable for equal scores.
    fn sort_and_dedup(&mut self) {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(self.drafts.len());
        let mut deduped: Vec<FunctionDraft> = Vec::with_capacity(self.drafts.len());

        for draft in self.drafts.drain(..) {
            match index.get(&draft.draft_id) {
                Some(&i) => deduped[i] = draft,
                None => {
                    index.insert(draft.draft_id.clone(), deduped.len());
                    deduped.push(draft);
                }
            }
        }

        deduped.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        self.drafts = deduped;
    }
}
