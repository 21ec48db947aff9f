//! Relay workload image sources
//!
//! The image is configuration owned outside the operator. It is resolved on
//! every sync so a missing value only blocks workload creation.

use crate::error::{OperatorError, Result};
use std::fmt::Debug;

/// Environment variable holding the relay image reference
pub const IMAGE_ENV: &str = "PF_STATUS_RELAY_IMAGE";

/// Source of the relay workload image reference
pub trait ImageSource: Send + Sync + Debug {
    /// Current image reference, if configured
    fn image(&self) -> Option<String>;

    /// Where the image comes from, for error messages
    fn describe(&self) -> String;

    /// Current image reference, or a configuration error
    fn require(&self) -> Result<String> {
        self.image()
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| OperatorError::Configuration(format!("{} must be set", self.describe())))
    }
}

/// Reads the image from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvImageSource {
    var: String,
}

impl EnvImageSource {
    pub fn new() -> Self {
        Self::with_var(IMAGE_ENV)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for EnvImageSource {
    fn image(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }

    fn describe(&self) -> String {
        self.var.clone()
    }
}

/// Fixed image reference, typically from the configuration file
#[derive(Debug, Clone, Default)]
pub struct StaticImageSource {
    image: Option<String>,
}

impl StaticImageSource {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
        }
    }

    pub fn unset() -> Self {
        Self { image: None }
    }
}

impl ImageSource for StaticImageSource {
    fn image(&self) -> Option<String> {
        self.image.clone()
    }

    fn describe(&self) -> String {
        "image".to_string()
    }
}
