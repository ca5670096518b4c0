use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator-facing detailed case statuses.
///
/// The list is append-only; every value is reachable only through
/// `StatusOrchestrator::transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailedStatus {
    /// Case has been received and is awaiting triage
    Intake,
    /// Data completeness checks and operator corrections happen here
    Validation,
    /// Clinical reviewers are working the case
    ClinicalReview,
    /// Payload sent upstream, awaiting tracking-number acknowledgement
    TrackingPending,
    /// Tracking number received from the upstream authority
    TrackingReceived,
    /// Decision letter is being rendered
    LetterGeneration,
    /// Decision letter has been dispatched
    LetterSent,
    /// Terminal: decision fully processed
    Complete,
    /// Terminal: case dismissed without a decision on the merits
    Dismissed,
}

impl DetailedStatus {
    /// Check if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Dismissed)
    }

    /// Valid transition check. The backward edge from `TrackingPending` to
    /// `Validation` is the remediation loop and is deliberately allowed.
    pub fn can_transition_to(&self, target: DetailedStatus) -> bool {
        use DetailedStatus::*;
        matches!(
            (self, target),
            (Intake, Validation)
                | (Intake, Dismissed)
                | (Validation, ClinicalReview)
                | (Validation, TrackingPending)
                | (Validation, Dismissed)
                | (ClinicalReview, TrackingPending)
                | (ClinicalReview, Validation)
                | (ClinicalReview, Dismissed)
                | (TrackingPending, TrackingReceived)
                | (TrackingPending, Validation)
                | (TrackingReceived, LetterGeneration)
                | (TrackingReceived, Complete)
                | (TrackingReceived, Dismissed)
                | (LetterGeneration, LetterSent)
                | (LetterSent, Complete)
        )
    }
}

impl fmt::Display for DetailedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intake => write!(f, "intake"),
            Self::Validation => write!(f, "validation"),
            Self::ClinicalReview => write!(f, "clinical_review"),
            Self::TrackingPending => write!(f, "tracking_pending"),
            Self::TrackingReceived => write!(f, "tracking_received"),
            Self::LetterGeneration => write!(f, "letter_generation"),
            Self::LetterSent => write!(f, "letter_sent"),
            Self::Complete => write!(f, "complete"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl std::str::FromStr for DetailedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(Self::Intake),
            "validation" => Ok(Self::Validation),
            "clinical_review" => Ok(Self::ClinicalReview),
            "tracking_pending" => Ok(Self::TrackingPending),
            "tracking_received" => Ok(Self::TrackingReceived),
            "letter_generation" => Ok(Self::LetterGeneration),
            "letter_sent" => Ok(Self::LetterSent),
            "complete" => Ok(Self::Complete),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(format!("Invalid detailed status: {s}")),
        }
    }
}

impl Default for DetailedStatus {
    fn default() -> Self {
        Self::Intake
    }
}
