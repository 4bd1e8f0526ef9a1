/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub drag: DragConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// Downward acceleration per time step unit.
    pub gravity: f64,
    /// Kinematic time step per tick.
    pub time_step: f64,
    /// Jump impulse (negative = upward).
    pub jump_velocity: f64,
    /// Horizontal world-scroll per tick while a movement key is held.
    pub walk_speed: f64,
    /// Slower walk while the modifier is held.
    pub creep_speed: f64,
    /// Shift deltas below this magnitude are dropped instead of retried.
    pub shift_epsilon: f64,
}

impl PhysicsConfig {
    /// Falling speed cap: twice the jump impulse magnitude.
    pub fn terminal_velocity(&self) -> f64 {
        self.jump_velocity * -2.0
    }
}

#[derive(Clone, Debug)]
pub struct DragConfig {
    /// Sampling stride of the line collision probe, world units.
    pub probe_stride: f64,
    /// Cooldown for a drag released where it started.
    pub recharge_min_secs: f64,
    /// Cooldown for the longest possible carry.
    pub recharge_max_secs: f64,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub tick_rate_ms: u64,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    drag: TomlDrag,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_time_step")]
    time_step: f64,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f64,
    #[serde(default = "default_walk_speed")]
    walk_speed: f64,
    #[serde(default = "default_creep_speed")]
    creep_speed: f64,
    #[serde(default = "default_shift_epsilon")]
    shift_epsilon: f64,
}

#[derive(Deserialize, Debug)]
struct TomlDrag {
    #[serde(default = "default_probe_stride")]
    probe_stride: f64,
    #[serde(default = "default_recharge_min")]
    recharge_min_secs: f64,
    #[serde(default = "default_recharge_max")]
    recharge_max_secs: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

// ── Defaults ──

fn default_gravity() -> f64 { 9.81 }
fn default_time_step() -> f64 { 0.1 }
fn default_jump_velocity() -> f64 { -65.0 }
fn default_walk_speed() -> f64 { 3.0 }
fn default_creep_speed() -> f64 { 1.0 }
fn default_shift_epsilon() -> f64 { 0.05 }

fn default_probe_stride() -> f64 { 20.0 }
fn default_recharge_min() -> f64 { 0.75 }
fn default_recharge_max() -> f64 { 2.0 }

fn default_tick_rate() -> u64 { 8 }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            time_step: default_time_step(),
            jump_velocity: default_jump_velocity(),
            walk_speed: default_walk_speed(),
            creep_speed: default_creep_speed(),
            shift_epsilon: default_shift_epsilon(),
        }
    }
}

impl Default for TomlDrag {
    fn default() -> Self {
        TomlDrag {
            probe_stride: default_probe_stride(),
            recharge_min_secs: default_recharge_min(),
            recharge_max_secs: default_recharge_max(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        TomlPhysics::default().into()
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        TomlDrag::default().into()
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            gravity: t.gravity,
            time_step: t.time_step,
            jump_velocity: t.jump_velocity,
            walk_speed: t.walk_speed,
            creep_speed: t.creep_speed,
            shift_epsilon: t.shift_epsilon,
        }
    }
}

impl From<TomlDrag> for DragConfig {
    fn from(t: TomlDrag) -> Self {
        DragConfig {
            probe_stride: t.probe_stride,
            recharge_min_secs: t.recharge_min_secs,
            recharge_max_secs: t.recharge_max_secs,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig {
            physics: toml_cfg.physics.into(),
            drag: toml_cfg.drag.into(),
            general: GeneralConfig { tick_rate_ms: toml_cfg.general.tick_rate_ms },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuning() {
        let p = PhysicsConfig::default();
        assert_eq!(p.gravity, 9.81);
        assert_eq!(p.jump_velocity, -65.0);
        assert_eq!(p.terminal_velocity(), 130.0);

        let d = DragConfig::default();
        assert_eq!(d.probe_stride, 20.0);
        assert_eq!(d.recharge_min_secs, 0.75);
        assert_eq!(d.recharge_max_secs, 2.0);
    }

    #[test]
    fn partial_toml_fills_missing_keys() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [physics]
            jump_velocity = -50.0

            [general]
            tick_rate_ms = 16
            "#,
        )
        .unwrap();
        assert_eq!(cfg.physics.jump_velocity, -50.0);
        assert_eq!(cfg.physics.gravity, 9.81);
        assert_eq!(cfg.drag.probe_stride, 20.0);
        assert_eq!(cfg.general.tick_rate_ms, 16);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.physics.walk_speed, 3.0);
        assert_eq!(cfg.drag.recharge_max_secs, 2.0);
    }
}
