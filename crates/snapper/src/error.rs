//! Error types for snapping operations

use thiserror::Error;

use crate::frame::FrameRef;
use crate::scene::ObjectId;

/// Snapping errors
///
/// Every operation that returns one of these has left the scene exactly
/// as it found it.
#[derive(Debug, Error)]
pub enum SnapError {
    /// No object is active when an operation needs one
    #[error("No active object")]
    NoActiveSubject,

    /// The operation needs at least one candidate frame and found none
    #[error("No eligible snap candidates")]
    NoEligibleCandidates,

    /// A selection-driven edit found nothing selected
    #[error("Nothing selected for {0}")]
    EmptySelection(&'static str),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Frame {frame} not found on {object}")]
    FrameNotFound { object: ObjectId, frame: FrameRef },

    #[error("Snapping is disabled on {0}")]
    SnappingDisabled(ObjectId),

    /// A composed transform was singular or not finite
    #[error("Operation would produce an invalid transform")]
    InvalidTransform,

    #[error("Parenting {child} to {parent} would create a cycle")]
    HierarchyCycle { child: ObjectId, parent: ObjectId },

    #[error("An interactive snapping session is already running")]
    SessionActive,

    /// The object cannot be projected onto the view
    #[error("{0} is not visible from the current view")]
    OffScreen(ObjectId),

    #[error("{0} has no edit geometry")]
    NoGeometry(ObjectId),

    #[error("Invalid snapper configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for snapping operations
pub type Result<T> = std::result::Result<T, SnapError>;
