use thiserror::Error;

/// Errors raised while building a simulation from its configuration.
///
/// These are fatal at construction time. Nothing in the per-sub-step path returns one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid world bounds: min ({min_x}, {min_y}) must be strictly below max ({max_x}, {max_y})")]
    InvalidBounds {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },

    #[error("invalid cell size {0}: must be finite and > 0")]
    InvalidCellSize(f32),

    #[error("invalid radius {0}: must be finite and > 0")]
    InvalidRadius(f32),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_offender() {
        let msg = ConfigError::InvalidRadius(-0.5).to_string();
        assert!(msg.contains("radius"));
        assert!(msg.contains("-0.5"));

        let msg = ConfigError::parameter("damping must lie in [0, 1]").to_string();
        assert!(msg.contains("damping"));
    }
}
