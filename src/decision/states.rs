use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision kind recorded when a version chain is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    /// A clinical determination was (or will be) made on the merits
    Approve,
    /// The request was dismissed without a determination on the merits
    Dismissal,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "APPROVE"),
            Self::Dismissal => write!(f, "DISMISSAL"),
        }
    }
}

impl std::str::FromStr for DecisionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(Self::Approve),
            "DISMISSAL" => Ok(Self::Dismissal),
            _ => Err(format!("Invalid decision kind: {s}")),
        }
    }
}

/// Operational lifecycle of a decision version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalDecision {
    Pending,
    Dismissal,
    DismissalComplete,
    DecisionComplete,
}

impl OperationalDecision {
    /// Terminal operational outcomes
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::DismissalComplete | Self::DecisionComplete)
    }

    /// The complete value this kind of decision terminates in
    pub fn complete_value_for(kind: DecisionKind) -> Self {
        match kind {
            DecisionKind::Dismissal => Self::DismissalComplete,
            DecisionKind::Approve => Self::DecisionComplete,
        }
    }
}

impl fmt::Display for OperationalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Dismissal => write!(f, "DISMISSAL"),
            Self::DismissalComplete => write!(f, "DISMISSAL_COMPLETE"),
            Self::DecisionComplete => write!(f, "DECISION_COMPLETE"),
        }
    }
}

impl std::str::FromStr for OperationalDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "DISMISSAL" => Ok(Self::Dismissal),
            "DISMISSAL_COMPLETE" => Ok(Self::DismissalComplete),
            "DECISION_COMPLETE" => Ok(Self::DecisionComplete),
            _ => Err(format!("Invalid operational decision: {s}")),
        }
    }
}

/// Clinical outcome of the review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinicalDecision {
    Pending,
    Affirm,
    NonAffirm,
}

impl ClinicalDecision {
    /// Whether an outcome has been reached
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ClinicalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Affirm => write!(f, "AFFIRM"),
            Self::NonAffirm => write!(f, "NON_AFFIRM"),
        }
    }
}

impl std::str::FromStr for ClinicalDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "AFFIRM" => Ok(Self::Affirm),
            "NON_AFFIRM" => Ok(Self::NonAffirm),
            _ => Err(format!("Invalid clinical decision: {s}")),
        }
    }
}

/// Origin of the authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSubtype {
    Direct,
    Standard,
}

impl fmt::Display for DecisionSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "DIRECT"),
            Self::Standard => write!(f, "STANDARD"),
        }
    }
}

impl std::str::FromStr for DecisionSubtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIRECT" => Ok(Self::Direct),
            "STANDARD" => Ok(Self::Standard),
            _ => Err(format!("Invalid decision subtype: {s}")),
        }
    }
}

/// Coverage part the request falls under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoveragePart {
    A,
    B,
}

impl fmt::Display for CoveragePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl std::str::FromStr for CoveragePart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            _ => Err(format!("Invalid coverage part: {s}")),
        }
    }
}

/// Tracking-number issuance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Invalid tracking status: {s}")),
        }
    }
}

/// Letter generation/delivery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterStatus {
    NotStarted,
    Generated,
    Sent,
}

impl fmt::Display for LetterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Generated => write!(f, "GENERATED"),
            Self::Sent => write!(f, "SENT"),
        }
    }
}

impl std::str::FromStr for LetterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "GENERATED" => Ok(Self::Generated),
            "SENT" => Ok(Self::Sent),
            _ => Err(format!("Invalid letter status: {s}")),
        }
    }
}

/// Outbound payload delivery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Acknowledged,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Sent => write!(f, "SENT"),
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "ACKNOWLEDGED" => Ok(Self::Acknowledged),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Invalid delivery status: {s}")),
        }
    }
}

impl Default for OperationalDecision {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for ClinicalDecision {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for TrackingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for LetterStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self::Pending
    }
}
