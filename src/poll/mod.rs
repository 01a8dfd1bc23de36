use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::notify::Notifier;
use crate::review::ReviewClient;
use crate::store::{StatusStore, SubmissionStatus};

/// A detected status transition for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub id: String,
    pub name: String,
    pub old: SubmissionStatus,
    pub new: SubmissionStatus,
    pub reviewer_comment: Option<String>,
}

impl ChangeEvent {
    /// Render the notification text for this change.
    pub fn render(&self) -> String {
        let mut text = format!(
            "Review status changed for \"{}\": {} -> {}. {}",
            self.name,
            self.old,
            self.new,
            self.new.verdict()
        );
        if let Some(comment) = &self.reviewer_comment {
            text.push_str(&format!("\nReviewer comment: {comment}"));
        }
        text
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// All snapshots processed, every due notification delivered.
    Success,
    /// Some change notifications failed to send; those submissions are
    /// retried next tick because the store was not advanced for them.
    Partial { failed: usize },
    /// The status fetch itself failed; no state was mutated.
    Failure,
}

/// Consecutive poll failures exceeded the configured limit.
#[derive(Debug, thiserror::Error)]
#[error("{failures} consecutive poll failures reached the fatal threshold")]
pub struct FatalThreshold {
    pub failures: u32,
}

/// The polling engine: fetch, diff against the store, notify, advance.
///
/// Drives its collaborators through the `ReviewClient` and `Notifier`
/// traits and owns the `StatusStore` for its whole lifetime. Ticks never
/// overlap; `run` executes one tick at a time on a fixed interval and
/// sleeping between ticks is the only suspension point.
pub struct PollLoop<R, N> {
    client: R,
    notifier: N,
    store: StatusStore,
    interval: Duration,
    failure_threshold: u32,
    consecutive_failures: u32,
    /// Last problem text reported to the chat, to avoid re-sending the
    /// same failure report on every tick of a long outage.
    last_problem_report: Option<String>,
}

impl<R: ReviewClient, N: Notifier> PollLoop<R, N> {
    pub fn new(
        client: R,
        notifier: N,
        store: StatusStore,
        interval: Duration,
        failure_threshold: u32,
    ) -> Self {
        Self {
            client,
            notifier,
            store,
            interval,
            failure_threshold,
            consecutive_failures: 0,
            last_problem_report: None,
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Execute one poll cycle.
    ///
    /// The store is advanced for a changed submission only after the
    /// notifier accepted the change notification; a failed send leaves the
    /// entry untouched so the identical change is retried next tick.
    /// First-seen submissions are seeded silently.
    pub async fn tick(&mut self) -> TickOutcome {
        let snapshots = match self.client.fetch_statuses().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::error!("status fetch failed: {e}");
                self.report_problem(format!("Poll problem: {e}")).await;
                return TickOutcome::Failure;
            }
        };
        self.last_problem_report = None;

        let mut failed = 0usize;
        for snapshot in snapshots {
            let now = Utc::now();
            match self.store.get(&snapshot.id) {
                None => {
                    // First sighting: seed without notifying, otherwise a
                    // restart would re-announce every pre-existing submission.
                    tracing::info!(
                        "seeding submission {} ({}) at status {}",
                        snapshot.id,
                        snapshot.name,
                        snapshot.status
                    );
                    self.store.set(snapshot.id, snapshot.status, now);
                }
                Some(entry) if entry.status == snapshot.status => {}
                Some(entry) => {
                    let event = ChangeEvent {
                        id: snapshot.id.clone(),
                        name: snapshot.name,
                        old: entry.status,
                        new: snapshot.status,
                        reviewer_comment: snapshot.reviewer_comment,
                    };
                    match self.notifier.send(&event.render()).await {
                        Ok(()) => {
                            tracing::info!(
                                "submission {}: {} -> {}",
                                event.id,
                                event.old,
                                event.new
                            );
                            self.store.set(snapshot.id, snapshot.status, now);
                        }
                        Err(e) => {
                            tracing::error!(
                                "notification for submission {} failed, will retry next tick: {e}",
                                event.id
                            );
                            failed += 1;
                        }
                    }
                }
            }
        }

        if failed > 0 {
            TickOutcome::Partial { failed }
        } else {
            TickOutcome::Success
        }
    }

    /// Drive ticks on the configured interval until cancelled or the
    /// consecutive-failure threshold is reached.
    ///
    /// Cancellation interrupts the inter-tick sleep but never an in-flight
    /// tick, so the store stays consistent with delivered notifications.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), FatalThreshold> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Checked first so a tick coming due at the same moment as
                // cancellation never starts a fresh cycle.
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("shutdown requested, stopping poll loop");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            let outcome = self.tick().await;
            match outcome {
                TickOutcome::Failure => {
                    self.consecutive_failures += 1;
                    tracing::warn!(
                        "tick failed ({}/{} consecutive)",
                        self.consecutive_failures,
                        self.failure_threshold
                    );
                    if self.consecutive_failures >= self.failure_threshold {
                        let fatal = FatalThreshold {
                            failures: self.consecutive_failures,
                        };
                        tracing::error!("{fatal}, shutting down");
                        // Best effort only: delivery may well be the thing
                        // that is broken.
                        if let Err(e) = self.notifier.send(&format!("Shutting down: {fatal}.")).await
                        {
                            tracing::error!("final notification failed: {e}");
                        }
                        return Err(fatal);
                    }
                }
                TickOutcome::Partial { failed } => {
                    tracing::warn!("tick partially failed: {failed} notification(s) not delivered");
                    self.consecutive_failures = 0;
                }
                TickOutcome::Success => {
                    self.consecutive_failures = 0;
                }
            }
        }
    }

    /// Report an operational problem to the chat, best-effort and
    /// deduplicated against the previous report.
    async fn report_problem(&mut self, text: String) {
        if self.last_problem_report.as_deref() == Some(text.as_str()) {
            tracing::debug!("suppressing repeated problem report");
            return;
        }
        match self.notifier.send(&text).await {
            Ok(()) => self.last_problem_report = Some(text),
            Err(e) => tracing::error!("problem report delivery failed: {e}"),
        }
    }
}
