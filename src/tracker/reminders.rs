use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::InputError;

use super::events::TrackerEvent;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 15;

#[derive(Debug)]
pub enum ReminderOutcome {
    /// A reminder will fire at `handle.remind_at()` unless cancelled.
    Scheduled(ReminderHandle),
    /// The activity is less than the lead time away; nothing was scheduled.
    StartingSoon,
}

/// Cancels one pending reminder. Dropping the handle does not cancel it.
#[derive(Debug, Clone)]
pub struct ReminderHandle {
    id: String,
    activity: String,
    remind_at: DateTime<Utc>,
    token: CancellationToken,
}

impl ReminderHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn remind_at(&self) -> DateTime<Utc> {
        self.remind_at
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Fire-once reminders ahead of an activity, delivered as [`TrackerEvent::Reminder`].
/// All reminders hang off one session token so they can be cancelled together.
pub struct ReminderScheduler {
    lead: Duration,
    events: broadcast::Sender<TrackerEvent>,
    session: Mutex<CancellationToken>,
}

impl ReminderScheduler {
    pub fn new(lead: Duration, events: broadcast::Sender<TrackerEvent>) -> Self {
        Self {
            lead,
            events,
            session: Mutex::new(CancellationToken::new()),
        }
    }

    /// Schedule a reminder `lead` before `activity_time`. Must be called inside a
    /// tokio runtime.
    pub fn schedule<Tz: TimeZone>(
        &self,
        activity: &str,
        activity_time: DateTime<Utc>,
        now: &DateTime<Tz>,
    ) -> Result<ReminderOutcome, InputError> {
        let now_utc = now.with_timezone(&Utc);
        if activity_time < now_utc {
            return Err(InputError::ReminderInPast(activity_time.to_rfc3339()));
        }

        let remind_at = activity_time - self.lead;
        if remind_at <= now_utc {
            log_info!("'{}' starts within {} minutes; no reminder scheduled", activity, self.lead.num_minutes());
            return Ok(ReminderOutcome::StartingSoon);
        }

        let delay = (remind_at - now_utc)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let token = self.session().child_token();
        let handle = ReminderHandle {
            id: Uuid::new_v4().to_string(),
            activity: activity.to_string(),
            remind_at,
            token: token.clone(),
        };

        let event = TrackerEvent::Reminder {
            reminder_id: handle.id.clone(),
            activity: handle.activity.clone(),
            activity_time,
            lead_minutes: self.lead.num_minutes(),
        };
        let events = self.events.clone();
        let activity = handle.activity.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log_info!("Reminder for '{}' cancelled", activity);
                }
                _ = tokio::time::sleep(delay) => {
                    log_info!("Reminder fired for '{}'", activity);
                    let _ = events.send(event);
                }
            }
        });

        log_info!("Reminder for '{}' set for {}", handle.activity, remind_at);
        Ok(ReminderOutcome::Scheduled(handle))
    }

    /// Cancel every pending reminder. Reminders scheduled afterwards are unaffected.
    pub fn cancel_all(&self) {
        let mut session = self.session();
        session.cancel();
        *session = CancellationToken::new();
    }

    fn session(&self) -> MutexGuard<'_, CancellationToken> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
