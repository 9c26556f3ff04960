//! Improvement recommendations derived from failure patterns and unresolved
//! rater disagreements.

pub mod config;
pub mod recommender;


pub use config::RecommenderConfig;
pub use recommender::{
    Recommender, action_for, build_recommendations, effort_for, priority_score, stated_priority,
};
