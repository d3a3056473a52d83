//! Schedule board: the admin's list of schedule definitions.
//!
//! Mutations are optimistic. The list changes locally first, the request is
//! sent, and the list is either rolled back to its snapshot or patched with
//! the server's copy. Upcoming/badge annotations are recomputed on every
//! call to [`ScheduleBoard::cards`], never cached.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::optimistic::OptimisticList;
use crate::recurrence::{next_occurrence, upcoming_schedule_id, RecurrenceRule, ScheduleTiming};
use crate::schedule::{validate_schedule, ScheduleDefinition, ScheduleInput};
use crate::store::{ConsoleError, ScheduleStore};
use crate::types::{DbId, LocalDateTime};

/// Badge shown on a schedule card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum ScheduleBadge {
    /// The single soonest schedule on the board.
    Next,
    Recurring(String),
    OneTime,
    /// Nothing left to show: past one-time event or finished series.
    Ended,
}

/// A schedule plus its read-time annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCard {
    #[serde(flatten)]
    pub schedule: ScheduleDefinition,
    pub next_occurrence: Option<LocalDateTime>,
    pub is_upcoming: bool,
    pub badge: ScheduleBadge,
}

/// Annotate every schedule against `now`.
pub fn annotate(schedules: &[ScheduleDefinition], now: LocalDateTime) -> Vec<ScheduleCard> {
    let timings: Vec<ScheduleTiming> = schedules.iter().map(ScheduleDefinition::timing).collect();
    let upcoming = upcoming_schedule_id(&timings, now);

    schedules
        .iter()
        .zip(&timings)
        .map(|(schedule, timing)| {
            let next = next_occurrence(timing, now);
            let is_upcoming = upcoming == Some(schedule.id);
            let badge = if is_upcoming {
                ScheduleBadge::Next
            } else if next.is_none() {
                ScheduleBadge::Ended
            } else {
                match &schedule.recurrence_rule {
                    RecurrenceRule::None => ScheduleBadge::OneTime,
                    rule => ScheduleBadge::Recurring(rule.display_label()),
                }
            };
            ScheduleCard {
                schedule: schedule.clone(),
                next_occurrence: next,
                is_upcoming,
                badge,
            }
        })
        .collect()
}

pub struct ScheduleBoard<S> {
    store: S,
    list: Mutex<OptimisticList<ScheduleDefinition>>,
    /// Placeholder ids for schedules not yet acknowledged by the server.
    next_temp_id: AtomicI64,
}

impl<S: ScheduleStore> ScheduleBoard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            list: Mutex::new(OptimisticList::default()),
            next_temp_id: AtomicI64::new(-1),
        }
    }

    /// Replace the local list with the server's.
    pub async fn refresh(&self) -> Result<(), ConsoleError> {
        let schedules = self.store.list_schedules().await?;
        tracing::debug!(count = schedules.len(), "Schedule board refreshed");
        self.list.lock().await.replace_all(schedules);
        Ok(())
    }

    pub async fn schedules(&self) -> Vec<ScheduleDefinition> {
        self.list.lock().await.items().to_vec()
    }

    pub async fn cards(&self, now: LocalDateTime) -> Vec<ScheduleCard> {
        annotate(self.list.lock().await.items(), now)
    }

    pub async fn create(&self, input: ScheduleInput) -> Result<ScheduleDefinition, ConsoleError> {
        validate_schedule(&input)?;

        let temp_id = self.next_temp_id.fetch_sub(1, Ordering::Relaxed);
        let snapshot = {
            let mut list = self.list.lock().await;
            let snapshot = list.snapshot();
            list.push(ScheduleDefinition::from_input(temp_id, input.clone()));
            snapshot
        };

        match self.store.create_schedule(&input).await {
            Ok(created) => {
                self.list
                    .lock()
                    .await
                    .replace_where(|s| s.id == temp_id, created.clone());
                tracing::info!(schedule_id = created.id, "Schedule created");
                Ok(created)
            }
            Err(err) => {
                self.list.lock().await.restore(snapshot);
                tracing::warn!(error = %err, "Schedule create failed, board restored");
                Err(err.into())
            }
        }
    }

    pub async fn update(
        &self,
        id: DbId,
        input: ScheduleInput,
    ) -> Result<ScheduleDefinition, ConsoleError> {
        validate_schedule(&input)?;

        let snapshot = {
            let mut list = self.list.lock().await;
            let snapshot = list.snapshot();
            let speculative = ScheduleDefinition::from_input(id, input.clone());
            if !list.replace_where(|s| s.id == id, speculative) {
                return Err(ConsoleError::UnknownSchedule(id));
            }
            snapshot
        };

        match self.store.update_schedule(id, &input).await {
            Ok(updated) => {
                self.list
                    .lock()
                    .await
                    .replace_where(|s| s.id == id, updated.clone());
                tracing::info!(schedule_id = id, "Schedule updated");
                Ok(updated)
            }
            Err(err) => {
                self.list.lock().await.restore(snapshot);
                tracing::warn!(schedule_id = id, error = %err, "Schedule update failed, board restored");
                Err(err.into())
            }
        }
    }

    pub async fn delete(&self, id: DbId) -> Result<(), ConsoleError> {
        let snapshot = {
            let mut list = self.list.lock().await;
            let snapshot = list.snapshot();
            if list.remove_where(|s| s.id == id).is_none() {
                return Err(ConsoleError::UnknownSchedule(id));
            }
            snapshot
        };

        if let Err(err) = self.store.delete_schedule(id).await {
            self.list.lock().await.restore(snapshot);
            tracing::warn!(schedule_id = id, error = %err, "Schedule delete failed, board restored");
            return Err(err.into());
        }

        tracing::info!(schedule_id = id, "Schedule deleted");
        Ok(())
    }
}
