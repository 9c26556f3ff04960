//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `GOLDEN_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::clustering::ClusterConfig;
use crate::consensus::ConsensusConfig;
use crate::constants::{
    DEFAULT_ANSWER_SIMILARITY_THRESHOLD, DEFAULT_AUTO_APPROVE_TRUST, DEFAULT_BATCH_INTERVAL_SECS,
    DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES, DEFAULT_CONSENSUS_STRENGTH_THRESHOLD,
    DEFAULT_INVALIDATION_TRUST, DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MIN_TRUST_SCORE,
    DEFAULT_REQUIRED_VALIDATIONS, DEFAULT_SEMANTIC_HIT_THRESHOLD, DEFAULT_SIGNATURE_CAPACITY,
    DEFAULT_VALIDATION_DEADLINE_SECS,
};
use crate::golden::GoldenConfig;
use crate::intake::IntakeConfig;
use crate::recommend::RecommenderConfig;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GOLDEN_*` overrides on top of defaults, then
/// derive the per-component configs from it.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Base URL of the embedding service. Unset means lexical embeddings only.
    pub embedder_url: Option<String>,

    /// Max entries in the golden signature index. Default: `10_000`.
    pub golden_capacity: u64,

    pub min_trust_score: f64,
    pub auto_approve_trust: f64,
    pub invalidation_trust: f64,
    pub semantic_threshold: f32,

    pub similarity_threshold: f64,
    pub strength_threshold: f64,
    pub required_validations: usize,
    pub validation_deadline: Duration,

    pub cluster_eps: f32,
    pub cluster_min_samples: usize,
    pub max_recommendations: usize,

    /// Interval between batch runs. Default: one hour.
    pub batch_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            embedder_url: None,
            golden_capacity: DEFAULT_SIGNATURE_CAPACITY,
            min_trust_score: DEFAULT_MIN_TRUST_SCORE,
            auto_approve_trust: DEFAULT_AUTO_APPROVE_TRUST,
            invalidation_trust: DEFAULT_INVALIDATION_TRUST,
            semantic_threshold: DEFAULT_SEMANTIC_HIT_THRESHOLD,
            similarity_threshold: DEFAULT_ANSWER_SIMILARITY_THRESHOLD,
            strength_threshold: DEFAULT_CONSENSUS_STRENGTH_THRESHOLD,
            required_validations: DEFAULT_REQUIRED_VALIDATIONS,
            validation_deadline: Duration::from_secs(DEFAULT_VALIDATION_DEADLINE_SECS),
            cluster_eps: DEFAULT_CLUSTER_EPS,
            cluster_min_samples: DEFAULT_CLUSTER_MIN_SAMPLES,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            batch_interval: Duration::from_secs(DEFAULT_BATCH_INTERVAL_SECS),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "GOLDEN_PORT";
    const ENV_BIND_ADDR: &'static str = "GOLDEN_BIND_ADDR";
    const ENV_EMBEDDER_URL: &'static str = "GOLDEN_EMBEDDER_URL";
    const ENV_L1_CAPACITY: &'static str = "GOLDEN_L1_CAPACITY";
    const ENV_MIN_TRUST: &'static str = "GOLDEN_MIN_TRUST_SCORE";
    const ENV_AUTO_APPROVE_TRUST: &'static str = "GOLDEN_AUTO_APPROVE_TRUST";
    const ENV_INVALIDATION_TRUST: &'static str = "GOLDEN_INVALIDATION_TRUST";
    const ENV_SEMANTIC_THRESHOLD: &'static str = "GOLDEN_SEMANTIC_THRESHOLD";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "GOLDEN_SIMILARITY_THRESHOLD";
    const ENV_STRENGTH_THRESHOLD: &'static str = "GOLDEN_STRENGTH_THRESHOLD";
    const ENV_REQUIRED_VALIDATIONS: &'static str = "GOLDEN_REQUIRED_VALIDATIONS";
    const ENV_VALIDATION_DEADLINE: &'static str = "GOLDEN_VALIDATION_DEADLINE_SECS";
    const ENV_CLUSTER_EPS: &'static str = "GOLDEN_CLUSTER_EPS";
    const ENV_CLUSTER_MIN_SAMPLES: &'static str = "GOLDEN_CLUSTER_MIN_SAMPLES";
    const ENV_MAX_RECOMMENDATIONS: &'static str = "GOLDEN_MAX_RECOMMENDATIONS";
    const ENV_BATCH_INTERVAL: &'static str = "GOLDEN_BATCH_INTERVAL_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            embedder_url: Self::parse_optional_string_from_env(Self::ENV_EMBEDDER_URL),
            golden_capacity: Self::parse_from_env(Self::ENV_L1_CAPACITY, defaults.golden_capacity)?,
            min_trust_score: Self::parse_from_env(Self::ENV_MIN_TRUST, defaults.min_trust_score)?,
            auto_approve_trust: Self::parse_from_env(
                Self::ENV_AUTO_APPROVE_TRUST,
                defaults.auto_approve_trust,
            )?,
            invalidation_trust: Self::parse_from_env(
                Self::ENV_INVALIDATION_TRUST,
                defaults.invalidation_trust,
            )?,
            semantic_threshold: Self::parse_from_env(
                Self::ENV_SEMANTIC_THRESHOLD,
                defaults.semantic_threshold,
            )?,
            similarity_threshold: Self::parse_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.similarity_threshold,
            )?,
            strength_threshold: Self::parse_from_env(
                Self::ENV_STRENGTH_THRESHOLD,
                defaults.strength_threshold,
            )?,
            required_validations: Self::parse_from_env(
                Self::ENV_REQUIRED_VALIDATIONS,
                defaults.required_validations,
            )?,
            validation_deadline: Self::parse_secs_from_env(
                Self::ENV_VALIDATION_DEADLINE,
                defaults.validation_deadline,
            )?,
            cluster_eps: Self::parse_from_env(Self::ENV_CLUSTER_EPS, defaults.cluster_eps)?,
            cluster_min_samples: Self::parse_from_env(
                Self::ENV_CLUSTER_MIN_SAMPLES,
                defaults.cluster_min_samples,
            )?,
            max_recommendations: Self::parse_from_env(
                Self::ENV_MAX_RECOMMENDATIONS,
                defaults.max_recommendations,
            )?,
            batch_interval: Self::parse_secs_from_env(
                Self::ENV_BATCH_INTERVAL,
                defaults.batch_interval,
            )?,
        })
    }

    /// Checks every derived component config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn component(name: &'static str, e: impl Display) -> ConfigError {
            ConfigError::Component {
                component: name,
                reason: e.to_string(),
            }
        }

        self.intake_config()
            .validate()
            .map_err(|e| component("intake", e))?;
        self.golden_config()
            .validate()
            .map_err(|e| component("golden", e))?;
        self.consensus_config()
            .validate()
            .map_err(|e| component("consensus", e))?;
        self.cluster_config()
            .validate()
            .map_err(|e| component("clustering", e))?;
        self.recommender_config()
            .validate()
            .map_err(|e| component("recommender", e))?;
        if self.batch_interval.is_zero() {
            return Err(component("scheduler", "batch interval must be > 0"));
        }
        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn intake_config(&self) -> IntakeConfig {
        IntakeConfig::default().min_trust_score(self.min_trust_score)
    }

    pub fn golden_config(&self) -> GoldenConfig {
        GoldenConfig::default()
            .signature_capacity(self.golden_capacity)
            .auto_approve_trust(self.auto_approve_trust)
            .invalidation_trust(self.invalidation_trust)
            .semantic_threshold(self.semantic_threshold)
    }

    pub fn consensus_config(&self) -> ConsensusConfig {
        ConsensusConfig::default()
            .similarity_threshold(self.similarity_threshold)
            .strength_threshold(self.strength_threshold)
            .required_validations(self.required_validations)
            .validation_deadline(self.validation_deadline)
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig::default()
            .eps(self.cluster_eps)
            .min_samples(self.cluster_min_samples)
    }

    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig::default().max_recommendations(self.max_recommendations)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match env::var(var_name) {
            Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name: var_name,
                reason: e.to_string(),
                value,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        let secs = Self::parse_from_env(var_name, default.as_secs())?;
        Ok(Duration::from_secs(secs))
    }
}
