use crate::error::ConfigError;

const DEFAULT_TARGET_FPS: u32 = 60;

/// Tuning for the time-sliced runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Frames per second the host is expected to render at. Each frame-bound or
    /// idle run may consume one frame interval before yielding.
    target_fps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

impl SchedulerConfig {
    pub fn new(target_fps: u32) -> Result<Self, ConfigError> {
        if target_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(Self { target_fps })
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Budget of one time-sliced run, in milliseconds.
    pub fn target_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.target_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_sixty_fps() {
        let config = SchedulerConfig::default();
        assert_eq!(config.target_fps(), 60);
        assert!((config.target_interval_ms() - 16.666).abs() < 0.01);
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert_eq!(SchedulerConfig::new(0), Err(ConfigError::ZeroFrameRate));
    }

    #[test]
    fn custom_rate_changes_interval() {
        let config = SchedulerConfig::new(30).unwrap();
        assert!((config.target_interval_ms() - 33.333).abs() < 0.01);
    }
}
