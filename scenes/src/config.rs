//! TOML configuration for the battleground scene.
//!
//! Every key is optional; omitted keys keep their defaults.
//!
//! ```toml
//! seed = 7
//!
//! [grid]
//! level = "field"
//!
//! [combat]
//! bullet_speed = 400.0
//! target_priority = "nearest"
//!
//! [movement]
//! connectivity = "eight"
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use flow_defence_core::{Connectivity, ScreenTransform, Viewport};
use flow_defence_system_movement::Config as MovementSystemConfig;
use flow_defence_system_tower_targeting::{Config as TargetingConfig, TargetPriority};
use flow_defence_world::{LevelStore, WorldConfig};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("could not read configuration file {path}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("configuration file {path} is malformed")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Complete battleground configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattlegroundConfig {
    /// Seed of the idle animation generator.
    pub seed: u64,
    /// Level selection and fallback grid size.
    pub grid: GridConfig,
    /// Mapping between cells and screen positions.
    pub transform: TransformConfig,
    /// Screen rectangle bullets stay inside.
    pub viewport: ViewportConfig,
    /// Bullet and targeting rules.
    pub combat: CombatConfig,
    /// Walker steering rules.
    pub movement: MovementConfig,
    /// Locations of level and definition files.
    pub assets: AssetsConfig,
}

/// `[grid]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Level loaded from the levels directory; an open grid is used when unset.
    pub level: Option<String>,
    /// Columns of the fallback grid.
    pub width: u32,
    /// Rows of the fallback grid.
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            level: None,
            width: 20,
            height: 14,
        }
    }
}

/// `[transform]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Screen position of the centre of cell (0, 0).
    pub origin: [f32; 2],
    /// Side length of a cell in pixels.
    pub cell_size: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        let transform = ScreenTransform::default();
        Self {
            origin: transform.origin().to_array(),
            cell_size: transform.cell_size(),
        }
    }
}

/// `[viewport]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            width: viewport.max().x,
            height: viewport.max().y,
        }
    }
}

/// `[combat]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombatConfig {
    /// Bullet speed in pixels per second.
    pub bullet_speed: f32,
    /// Bullet collision radius in pixels.
    pub bullet_radius: f32,
    /// Walker collision radius in pixels.
    pub walker_hit_radius: f32,
    /// Bullet time-to-live in milliseconds.
    pub bullet_ttl_ms: u64,
    /// Rule used when a tower acquires a target.
    pub target_priority: TargetPriority,
}

impl Default for CombatConfig {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            bullet_speed: world.bullet_speed,
            bullet_radius: world.bullet_radius,
            walker_hit_radius: world.walker_hit_radius,
            bullet_ttl_ms: u64::try_from(world.bullet_ttl.as_millis()).unwrap_or(u64::MAX),
            target_priority: TargetPriority::default(),
        }
    }
}

/// `[movement]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    /// Squared pixel distance at which a walker reaches a cell centre.
    pub arrive_threshold_sq: f32,
    /// Neighbourhood used by the flow field.
    pub connectivity: Connectivity,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            arrive_threshold_sq: MovementSystemConfig::default().arrive_threshold_sq(),
            connectivity: Connectivity::default(),
        }
    }
}

/// `[assets]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory holding level files.
    pub levels: PathBuf,
    /// Walker definition file; built-in definitions are used when unset.
    pub walkers: Option<PathBuf>,
    /// Tower definition file; built-in definitions are used when unset.
    pub towers: Option<PathBuf>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            levels: PathBuf::from("levels"),
            walkers: None,
            towers: None,
        }
    }
}

impl BattlegroundConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads configuration from the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Reads configuration from `path`, using defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Rules for the world.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            transform: ScreenTransform::new(
                Vec2::from_array(self.transform.origin),
                self.transform.cell_size,
            ),
            viewport: Viewport::new(
                Vec2::ZERO,
                Vec2::new(self.viewport.width, self.viewport.height),
            ),
            connectivity: self.movement.connectivity,
            bullet_speed: self.combat.bullet_speed,
            bullet_radius: self.combat.bullet_radius,
            walker_hit_radius: self.combat.walker_hit_radius,
            bullet_ttl: Duration::from_millis(self.combat.bullet_ttl_ms),
        }
    }

    /// Configuration of the movement system.
    #[must_use]
    pub fn movement_config(&self) -> MovementSystemConfig {
        MovementSystemConfig::new(self.movement.arrive_threshold_sq)
    }

    /// Configuration of the targeting system.
    #[must_use]
    pub fn targeting_config(&self) -> TargetingConfig {
        TargetingConfig::new(self.combat.target_priority, self.seed)
    }

    /// Store over the configured levels directory.
    #[must_use]
    pub fn level_store(&self) -> LevelStore {
        LevelStore::new(self.assets.levels.clone())
    }
}
