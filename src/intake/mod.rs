//! Feedback intake: the request path for rater judgements.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod submission;


pub use config::IntakeConfig;
pub use error::{IntakeError, IntakeResult, RaterNotQualifiedError, ValidationError};
pub use pipeline::FeedbackIntake;
pub use submission::{FeedbackReceipt, FeedbackSubmission, ValidatedFeedback};
