//! Spatial index configuration
//!
//! Configuration is plain serde data so it can live in the same TOML files
//! as the rest of a game's settings. Invalid values are rejected up front
//! when the index is created, never at query time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::AABB;
use crate::foundation::math::Vec3;

/// Errors raised when validating or parsing a [`SpatialConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// World bounds are degenerate (non-finite center or non-positive extent)
    #[error("invalid world bounds: center {center:?}, extent {extent}")]
    InvalidBounds {
        /// Configured world center
        center: [f32; 3],
        /// Configured world half-extent
        extent: f32,
    },

    /// Maximum depth of zero would forbid the root node itself
    #[error("max_depth must be at least 1")]
    ZeroDepth,

    /// A node must be able to hold at least one entry
    #[error("max_entries_per_node must be at least 1")]
    ZeroCapacity,

    /// Minimum node size must be positive to bound subdivision
    #[error("min_node_size must be positive and finite, got {0}")]
    InvalidMinNodeSize(f32),

    /// The TOML source could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the spatial index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Center of the world bounding volume
    pub world_center: [f32; 3],

    /// Half-extent of the world bounding volume on each axis
    pub world_extent: f32,

    /// Maximum entries per node before subdivision
    pub max_entries_per_node: usize,

    /// Maximum subdivision depth (root = depth 0)
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            world_center: [0.0, 0.0, 0.0],
            world_extent: 512.0,
            max_entries_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

impl SpatialConfig {
    /// World bounding volume described by this config
    pub fn world_bounds(&self) -> AABB {
        let center = Vec3::new(self.world_center[0], self.world_center[1], self.world_center[2]);
        AABB::from_center_extents(center, Vec3::new(self.world_extent, self.world_extent, self.world_extent))
    }

    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let center_finite = self.world_center.iter().all(|c| c.is_finite());
        if !center_finite || !self.world_extent.is_finite() || self.world_extent <= 0.0 {
            return Err(ConfigError::InvalidBounds {
                center: self.world_center,
                extent: self.world_extent,
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.max_entries_per_node == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.min_node_size.is_finite() || self.min_node_size <= 0.0 {
            return Err(ConfigError::InvalidMinNodeSize(self.min_node_size));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML source
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SpatialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_bounds() {
        let config = SpatialConfig { world_extent: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBounds { .. })));

        let config = SpatialConfig { world_extent: f32::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBounds { .. })));
    }

    #[test]
    fn test_rejects_zero_depth_and_capacity() {
        let config = SpatialConfig { max_depth: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDepth)));

        let config = SpatialConfig { max_entries_per_node: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn test_parse_from_toml() {
        let config = SpatialConfig::from_toml_str(
            r#"
            world_center = [0.0, 0.0, 0.0]
            world_extent = 50.0
            max_entries_per_node = 8
            max_depth = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_entries_per_node, 8);
        // Omitted fields fall back to defaults
        assert!((config.min_node_size - 1.0).abs() < f32::EPSILON);

        let bounds = config.world_bounds();
        assert_eq!(bounds.min, Vec3::new(-50.0, -50.0, -50.0));
        assert_eq!(bounds.max, Vec3::new(50.0, 50.0, 50.0));
    }

    #[test]
    fn test_parse_rejects_invalid_toml_values() {
        let result = SpatialConfig::from_toml_str("world_extent = -10.0");
        assert!(matches!(result, Err(ConfigError::InvalidBounds { .. })));
    }
}
