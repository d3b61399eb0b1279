use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{
    AdmissionCompleteness, AdmissionCondition, ConditionCode, EnrollmentId, MovementId,
    MovementKind, PlanId, SpaceId, StudentId,
};

/// Facts published after a write has been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    StudentRegistered {
        student: StudentId,
    },
    EnrollmentCreated {
        enrollment: EnrollmentId,
        student: StudentId,
        plan: PlanId,
        condition: AdmissionCondition,
    },
    AdmissionRecomputed {
        enrollment: EnrollmentId,
        completeness: AdmissionCompleteness,
        condition: AdmissionCondition,
    },
    MovementRecorded {
        enrollment: EnrollmentId,
        space: SpaceId,
        movement: MovementId,
        kind: MovementKind,
        condition: ConditionCode,
    },
    CourseRegistered {
        enrollment: EnrollmentId,
        space: SpaceId,
        academic_year: u16,
    },
    RulesSynchronized {
        plan: PlanId,
        space: SpaceId,
        inserted: usize,
        deleted: usize,
    },
}

impl DomainEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StudentRegistered { .. } => "student_registered",
            Self::EnrollmentCreated { .. } => "enrollment_created",
            Self::AdmissionRecomputed { .. } => "admission_recomputed",
            Self::MovementRecorded { .. } => "movement_recorded",
            Self::CourseRegistered { .. } => "course_registered",
            Self::RulesSynchronized { .. } => "rules_synchronized",
        }
    }
}

pub trait EventSubscriber: Send + Sync {
    fn notify(&self, event: &DomainEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event subscriber unavailable: {0}")]
    Unavailable(String),
}

/// Fan-out of domain events to the registered subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    /// Delivers `event` to every subscriber and returns how many accepted it. The write
    /// that produced the event already happened, so failures are only logged.
    pub fn publish(&self, event: DomainEvent) -> usize {
        let mut delivered = 0;
        for subscriber in &self.subscribers {
            match subscriber.notify(&event) {
                Ok(()) => delivered += 1,
                Err(err) => warn!(event = event.name(), error = %err, "event subscriber failed"),
            }
        }
        debug!(event = event.name(), delivered, "domain event published");
        delivered
    }
}
