//! Event orchestrator.
//!
//! Handles detections one at a time. For a tag entering the `Active`
//! state:
//!
//! 1. classify the identifier against the two references
//! 2. for a recognized tag, show its color, wait the dwell, revert to idle
//! 3. read the clock and format the timestamp
//! 4. submit `{uid, timestamp}` to the remote log
//!
//! Submission starts only after the display has reverted. Every failure is
//! logged and recorded in the returned [`DetectionOutcome`]; nothing stops
//! the pipeline.

use serde::Serialize;
use tagwatch_cloud::{
    AnyPolicy, AuthSession, HttpTransport, LogSubmitter, ReqwestTransport, SubmissionPolicy,
    SubmitError, SubmitReceipt,
};
use tagwatch_core::{
    AccessLogEntry, CredentialId, IdentityCategory, ReferenceIds, SystemClock, TerminalConfig,
    TimestampFormatter, WallClock,
};
use tagwatch_display::{DisplayError, DisplayState, FeedbackController, Timer, TokioTimer};
use tagwatch_hardware::{
    AnyDisplay, DetectionEvent, DisplayTransport, ListenerEvent, ListenerHandle, TagState,
};
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// Counters over the lifetime of an orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Every event received, including ignored ones.
    pub events: u64,
    pub ignored: u64,
    pub category_a: u64,
    pub category_b: u64,
    pub unknown: u64,
    pub display_failures: u64,
    pub submitted: u64,
    pub submit_failures: u64,
}

/// What the display did for one detection.
#[derive(Debug)]
pub enum DisplayOutcome {
    /// Unknown tag, panel untouched.
    Skipped,
    /// Feedback shown for the dwell and reverted.
    Shown(DisplayState),
    Failed(DisplayError),
}

/// Result of processing one `Active` detection.
#[derive(Debug)]
pub struct ProcessedDetection {
    pub uid: CredentialId,
    pub category: IdentityCategory,
    pub timestamp: String,
    pub display: DisplayOutcome,
    pub submission: std::result::Result<SubmitReceipt, SubmitError>,
}

/// Outcome of [`EventOrchestrator::handle`].
#[derive(Debug)]
pub enum DetectionOutcome {
    /// The event was not an activation.
    Ignored(TagState),
    Processed(Box<ProcessedDetection>),
}

impl DetectionOutcome {
    pub fn processed(&self) -> Option<&ProcessedDetection> {
        match self {
            DetectionOutcome::Processed(detection) => Some(detection),
            DetectionOutcome::Ignored(_) => None,
        }
    }
}

/// The detection pipeline.
///
/// The session must be signed in before events arrive; the orchestrator
/// only reads it.
pub struct EventOrchestrator<
    D = AnyDisplay,
    H = ReqwestTransport,
    P: SubmissionPolicy = AnyPolicy,
    T = TokioTimer,
    C = SystemClock,
> {
    references: ReferenceIds,
    feedback: FeedbackController<D, T>,
    formatter: TimestampFormatter<C>,
    session: AuthSession,
    transport: H,
    submitter: LogSubmitter<P>,
    stats: PipelineStats,
}

impl<D: DisplayTransport, H: HttpTransport> EventOrchestrator<D, H> {
    /// Assemble the pipeline from configuration.
    ///
    /// # Errors
    /// Returns `TerminalError::Config` for bad reference identifiers or zone
    /// rule, and `TerminalError::Display` for bad panel geometry.
    pub fn from_config(
        config: &TerminalConfig,
        display: D,
        transport: H,
        session: AuthSession,
    ) -> Result<Self> {
        Ok(Self::new(
            config.references.reference_ids()?,
            FeedbackController::from_config(display, &config.display)?,
            TimestampFormatter::new(config.time_zone()?),
            session,
            transport,
            LogSubmitter::from_config(&config.cloud, config.strict_status),
        ))
    }
}

impl<D, H, P, T, C> EventOrchestrator<D, H, P, T, C>
where
    D: DisplayTransport,
    H: HttpTransport,
    P: SubmissionPolicy,
    T: Timer,
    C: WallClock,
{
    pub fn new(
        references: ReferenceIds,
        feedback: FeedbackController<D, T>,
        formatter: TimestampFormatter<C>,
        session: AuthSession,
        transport: H,
        submitter: LogSubmitter<P>,
    ) -> Self {
        Self {
            references,
            feedback,
            formatter,
            session,
            transport,
            submitter,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn feedback(&self) -> &FeedbackController<D, T> {
        &self.feedback
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Paint the idle screen, e.g. once at startup.
    ///
    /// # Errors
    /// Returns the display error if the paint fails.
    pub async fn paint_idle(&mut self) -> std::result::Result<(), DisplayError> {
        self.feedback.paint_idle().await
    }

    /// Process one detection event to completion.
    pub async fn handle(&mut self, event: &DetectionEvent) -> DetectionOutcome {
        self.stats.events += 1;

        if !event.state.is_active() {
            debug!("Ignoring tag {} in state {}", event.uid, event.state);
            self.stats.ignored += 1;
            return DetectionOutcome::Ignored(event.state);
        }

        let category = self.references.classify(&event.uid);
        info!(uid = %event.uid, ?category, detected_at = %event.detected_at, "Tag detected");
        self.count(category);

        let display = match DisplayState::for_category(category) {
            Some(state) => match self.feedback.show(state).await {
                Ok(()) => DisplayOutcome::Shown(state),
                Err(e) => {
                    warn!("Display feedback for {} failed: {}", event.uid, e);
                    self.stats.display_failures += 1;
                    DisplayOutcome::Failed(e)
                }
            },
            None => {
                debug!("No feedback for unknown tag {}", event.uid);
                DisplayOutcome::Skipped
            }
        };

        let timestamp = self.formatter.now_formatted();
        let entry = AccessLogEntry::new(&event.uid, timestamp.clone());

        let submission = self
            .submitter
            .submit(&self.transport, &self.session, entry)
            .await;
        match &submission {
            Ok(receipt) => {
                self.stats.submitted += 1;
                info!(
                    uid = %event.uid,
                    status = receipt.status,
                    "Access logged at {}", timestamp
                );
            }
            Err(e) => {
                self.stats.submit_failures += 1;
                error!(uid = %event.uid, "Access log not submitted: {}", e);
            }
        }

        DetectionOutcome::Processed(Box::new(ProcessedDetection {
            uid: event.uid.clone(),
            category,
            timestamp,
            display,
            submission,
        }))
    }

    /// Drain the listener until the reader stops.
    ///
    /// Returns the counters at that point.
    pub async fn run(&mut self, listener: &mut ListenerHandle) -> PipelineStats {
        info!("Waiting for tags");

        while let Some(event) = listener.recv().await {
            match event {
                ListenerEvent::Detection(detection) => {
                    self.handle(&detection).await;
                }
                ListenerEvent::ReaderError { error } => {
                    error!("Tag reader failed: {}", error);
                }
                _ => debug!("Unhandled listener event"),
            }
        }

        info!(
            "Reader closed after {} events ({} logged, {} failed)",
            self.stats.events, self.stats.submitted, self.stats.submit_failures
        );
        self.stats.clone()
    }

    fn count(&mut self, category: IdentityCategory) {
        match category {
            IdentityCategory::CategoryA => self.stats.category_a += 1,
            IdentityCategory::CategoryB => self.stats.category_b += 1,
            IdentityCategory::Unknown => self.stats.unknown += 1,
        }
    }
}
