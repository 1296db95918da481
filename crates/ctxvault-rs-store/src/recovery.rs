//! Corruption recovery as an explicit state machine.
//!
//! ```text
//! Clean --(live bytes rejected)--> Recovering --(backup validates)--> Clean
//!                                      |
//!                                      +--(candidates exhausted)--> Failed
//! ```
//!
//! The machine performs no I/O itself; callers hand it the newest-first
//! backup list and a probe that reads and validates one candidate.

use crate::backup::BackupEntry;
use ctxvault_rs_protocol::ContextRecord;
use log::debug;
use std::collections::VecDeque;

/// Recovery progress for one record id.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryState {
    /// The record is readable (initially, or after a restore).
    Clean,
    /// Live bytes were rejected; remaining candidates are tried in order.
    Recovering {
        reason: String,
        pending: VecDeque<BackupEntry>,
        tried: usize,
    },
    /// Every candidate was rejected.
    Failed { reason: String, tried: usize },
}

/// A backup that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    /// Record decoded from the backup.
    pub record: ContextRecord,
    /// Backup the record came from.
    pub backup: BackupEntry,
    /// Candidates examined, including the accepted one.
    pub backups_tried: usize,
}

/// Terminal result of driving a `RecoveryState`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    /// A backup was accepted.
    Restored(Restored),
    /// Nothing usable was found.
    Failed { reason: String, backups_tried: usize },
}

impl RecoveryState {
    /// Enter `Recovering` with newest-first candidates.
    pub fn corrupted(reason: impl Into<String>, candidates: Vec<BackupEntry>) -> Self {
        RecoveryState::Recovering {
            reason: reason.into(),
            pending: candidates.into(),
            tried: 0,
        }
    }

    /// Whether no further steps can change the state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecoveryState::Recovering { .. })
    }

    /// Probe the next candidate.
    ///
    /// Returns the new state and, on the step that returns to `Clean`, the
    /// restored record. Terminal states are returned unchanged.
    pub fn step<F>(self, probe: F) -> (RecoveryState, Option<Restored>)
    where
        F: FnOnce(&BackupEntry) -> Result<ContextRecord, String>,
    {
        let RecoveryState::Recovering {
            reason,
            mut pending,
            tried,
        } = self
        else {
            return (self, None);
        };
        let Some(entry) = pending.pop_front() else {
            return (RecoveryState::Failed { reason, tried }, None);
        };
        let tried = tried + 1;
        match probe(&entry) {
            Ok(record) => (
                RecoveryState::Clean,
                Some(Restored {
                    record,
                    backup: entry,
                    backups_tried: tried,
                }),
            ),
            Err(rejection) => {
                debug!(
                    "backup rejected (id={}, timestamp={}, reason={rejection})",
                    entry.id, entry.timestamp
                );
                (
                    RecoveryState::Recovering {
                        reason,
                        pending,
                        tried,
                    },
                    None,
                )
            }
        }
    }

    /// Step until terminal.
    pub fn drive<F>(self, mut probe: F) -> RecoveryOutcome
    where
        F: FnMut(&BackupEntry) -> Result<ContextRecord, String>,
    {
        let mut state = self;
        loop {
            let (next, restored) = state.step(&mut probe);
            if let Some(restored) = restored {
                return RecoveryOutcome::Restored(restored);
            }
            match next {
                RecoveryState::Failed { reason, tried } => {
                    return RecoveryOutcome::Failed {
                        reason,
                        backups_tried: tried,
                    };
                }
                RecoveryState::Clean => {
                    return RecoveryOutcome::Failed {
                        reason: "recovery driven from a clean state".to_string(),
                        backups_tried: 0,
                    };
                }
                recovering => state = recovering,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecoveryOutcome, RecoveryState};
    use crate::backup::BackupEntry;
    use ctxvault_rs_protocol::ContextRecord;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn entry(timestamp: i64) -> BackupEntry {
        BackupEntry {
            id: "a".to_string(),
            timestamp,
            path: PathBuf::from(format!("/b/a.{timestamp}.backup.json")),
        }
    }

    fn record(title: &str) -> ContextRecord {
        ContextRecord::new(title, "").with_id("a")
    }

    #[test]
    fn no_candidates_fails_on_first_step() {
        let state = RecoveryState::corrupted("parse error", Vec::new());
        assert!(!state.is_terminal());
        let (next, restored) = state.step(|_| unreachable!("no candidates"));
        assert_eq!(restored, None);
        assert_eq!(
            next,
            RecoveryState::Failed {
                reason: "parse error".to_string(),
                tried: 0
            }
        );
        assert!(next.is_terminal());
    }

    #[test]
    fn walks_newest_first_until_a_candidate_validates() {
        let state = RecoveryState::corrupted("bad", vec![entry(30), entry(20), entry(10)]);
        let mut seen = Vec::new();
        let outcome = state.drive(|candidate| {
            seen.push(candidate.timestamp);
            if candidate.timestamp == 20 {
                Ok(record("second"))
            } else {
                Err("truncated".to_string())
            }
        });
        assert_eq!(seen, vec![30, 20]);
        match outcome {
            RecoveryOutcome::Restored(restored) => {
                assert_eq!(restored.backup.timestamp, 20);
                assert_eq!(restored.backups_tried, 2);
                assert_eq!(restored.record.title, "second");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn exhausting_candidates_fails_with_count() {
        let state = RecoveryState::corrupted("bad", vec![entry(2), entry(1)]);
        let outcome = state.drive(|_| Err("nope".to_string()));
        assert_eq!(
            outcome,
            RecoveryOutcome::Failed {
                reason: "bad".to_string(),
                backups_tried: 2
            }
        );
    }

    #[test]
    fn terminal_states_do_not_move() {
        let (next, restored) = RecoveryState::Clean.step(|_| Ok(record("x")));
        assert_eq!(next, RecoveryState::Clean);
        assert_eq!(restored, None);
    }
}
