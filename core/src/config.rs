//! Static configuration consumed by the world and systems.
//!
//! Every type here is read-only once a run starts. Adapters load a
//! [`GameConfig`] from disk, call [`GameConfig::validate`], and hand it to the
//! world. Missing fields fall back to the built-in demo values so partial
//! configuration files stay usable.

use std::{collections::HashSet, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TemplateId;

/// Number of pooled enemies preloaded for spawn entries without a count cap.
pub const UNCAPPED_PRELOAD: u32 = 20;

/// Seed used when a configuration does not provide one.
pub const DEFAULT_SEED: u64 = 0x5eed_0c41_9a2e_7f13;

/// Reasons a configuration value is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The run contains no normal waves.
    #[error("no normal waves configured")]
    NoWaves,
    /// The arena has nowhere to spawn enemies.
    #[error("no spawn points configured")]
    NoSpawnPoints,
    /// A wave has an empty spawn table.
    #[error("wave {wave} has an empty spawn table")]
    EmptySpawnTable {
        /// Number of the offending wave.
        wave: u32,
    },
    /// A wave's usable spawn entries carry no weight.
    #[error("wave {wave} has zero total spawn weight")]
    ZeroSpawnWeight {
        /// Number of the offending wave.
        wave: u32,
    },
    /// A wave's usable spawn weights add up to an unrepresentable total.
    #[error("wave {wave} has a non-finite total spawn weight")]
    NonFiniteSpawnWeight {
        /// Number of the offending wave.
        wave: u32,
    },
    /// A wave's spawn interval is zero, negative or not finite.
    #[error("wave {wave} has invalid spawn interval {interval}")]
    InvalidSpawnInterval {
        /// Number of the offending wave.
        wave: u32,
        /// Interval that was provided, in seconds.
        interval: f32,
    },
    /// A wave allows zero simultaneously alive enemies.
    #[error("wave {wave} allows zero concurrent enemies")]
    ZeroConcurrency {
        /// Number of the offending wave.
        wave: u32,
    },
    /// Two enemy templates share an identifier.
    #[error("enemy template {0:?} is defined more than once")]
    DuplicateTemplate(TemplateId),
    /// An enemy template has non-positive maximum health.
    #[error("enemy template {template:?} has invalid max health {max_health}")]
    InvalidTemplateHealth {
        /// Identifier of the offending template.
        template: TemplateId,
        /// Health value that was provided.
        max_health: f32,
    },
    /// The player has non-positive maximum health.
    #[error("player has invalid max health {0}")]
    InvalidPlayerHealth(f32),
}

/// Complete static description of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed from which every random stream of the run is derived.
    pub seed: u64,
    /// Arena geometry and pickup tuning.
    pub arena: ArenaConfig,
    /// Player stat sheet.
    pub player: PlayerConfig,
    /// Player weapon stat sheet.
    pub weapon: WeaponConfig,
    /// Combo effect and hand activation tuning.
    pub combo: ComboConfig,
    /// Enemy stat sheets referenced by spawn tables.
    pub enemy_templates: Vec<EnemyTemplate>,
    /// Normal waves in the order they are played.
    pub waves: Vec<WaveConfig>,
    /// Wave played after the normal sequence is exhausted.
    pub boss_wave: WaveConfig,
}

impl GameConfig {
    /// Identifiers of every configured enemy template.
    #[must_use]
    pub fn template_ids(&self) -> Vec<TemplateId> {
        self.enemy_templates.iter().map(|template| template.id).collect()
    }

    /// Looks up an enemy template by identifier.
    #[must_use]
    pub fn template(&self, id: TemplateId) -> Option<&EnemyTemplate> {
        self.enemy_templates.iter().find(|template| template.id == id)
    }

    /// Checks the whole configuration, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        if self.arena.spawn_points.is_empty() {
            return Err(ConfigError::NoSpawnPoints);
        }
        if !(self.player.max_health > 0.0) {
            return Err(ConfigError::InvalidPlayerHealth(self.player.max_health));
        }

        let mut seen = HashSet::new();
        for template in &self.enemy_templates {
            if !seen.insert(template.id) {
                return Err(ConfigError::DuplicateTemplate(template.id));
            }
            if !(template.max_health > 0.0) {
                return Err(ConfigError::InvalidTemplateHealth {
                    template: template.id,
                    max_health: template.max_health,
                });
            }
        }

        let known = self.template_ids();
        for wave in self.waves.iter().chain(std::iter::once(&self.boss_wave)) {
            wave.validate(&known)?;
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            arena: ArenaConfig::default(),
            player: PlayerConfig::default(),
            weapon: WeaponConfig::default(),
            combo: ComboConfig::default(),
            enemy_templates: vec![
                EnemyTemplate::default(),
                EnemyTemplate {
                    id: TemplateId::new(2),
                    name: "runner".to_owned(),
                    max_health: 8.0,
                    move_speed: 5.0,
                    score_reward: 30,
                    contact_damage: 6.0,
                    ..EnemyTemplate::default()
                },
                EnemyTemplate {
                    id: TemplateId::new(3),
                    name: "brute".to_owned(),
                    max_health: 60.0,
                    move_speed: 2.0,
                    score_reward: 150,
                    contact_damage: 20.0,
                    ..EnemyTemplate::default()
                },
                EnemyTemplate {
                    id: TemplateId::new(10),
                    name: "dealer".to_owned(),
                    max_health: 800.0,
                    move_speed: 1.5,
                    score_reward: 2_000,
                    contact_damage: 25.0,
                    is_boss: true,
                    ..EnemyTemplate::default()
                },
            ],
            waves: vec![
                WaveConfig::default(),
                WaveConfig {
                    wave_number: 2,
                    total_enemies: 8,
                    max_concurrent: 4,
                    spawn_interval_secs: 2.0,
                    spawn_table: vec![
                        SpawnEntry::weighted(TemplateId::new(1), 0.7),
                        SpawnEntry::weighted(TemplateId::new(2), 0.3),
                    ],
                },
                WaveConfig {
                    wave_number: 3,
                    total_enemies: 12,
                    max_concurrent: 5,
                    spawn_interval_secs: 1.5,
                    spawn_table: vec![
                        SpawnEntry::weighted(TemplateId::new(1), 0.5),
                        SpawnEntry::weighted(TemplateId::new(2), 0.3),
                        SpawnEntry {
                            max_count: 3,
                            ..SpawnEntry::weighted(TemplateId::new(3), 0.2)
                        },
                    ],
                },
            ],
            boss_wave: WaveConfig {
                wave_number: 4,
                total_enemies: 1,
                max_concurrent: 1,
                spawn_interval_secs: 1.0,
                spawn_table: vec![SpawnEntry {
                    max_count: 1,
                    ..SpawnEntry::weighted(TemplateId::new(10), 1.0)
                }],
            },
        }
    }
}

/// Arena geometry and chip pickup tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Positions at which enemies may enter the arena.
    pub spawn_points: Vec<Vec2>,
    /// Position the player occupies at the start of a run.
    pub player_start: Vec2,
    /// Offset applied to a dying enemy's position when its chip drops.
    pub chip_drop_offset: Vec2,
    /// Distance at which arena chips start drifting toward the player.
    pub magnet_range: f32,
    /// Speed, in world units per second, of drifting chips.
    pub magnet_speed: f32,
    /// Distance at which a drifting chip is collected into the hand.
    pub pickup_radius: f32,
    /// Number of chips constructed before the first run.
    pub chip_pool_size: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            spawn_points: vec![
                Vec2::new(-10.0, -10.0),
                Vec2::new(10.0, -10.0),
                Vec2::new(-10.0, 10.0),
                Vec2::new(10.0, 10.0),
            ],
            player_start: Vec2::ZERO,
            chip_drop_offset: Vec2::new(0.0, 0.5),
            magnet_range: 4.0,
            magnet_speed: 8.0,
            pickup_radius: 0.5,
            chip_pool_size: 100,
        }
    }
}

/// Player stat sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Maximum health.
    pub max_health: f32,
    /// Health regenerated per second once out of combat.
    pub regen_per_second: f32,
    /// Seconds without damage before regeneration resumes.
    pub regen_delay_secs: f32,
}

impl PlayerConfig {
    /// Delay without damage before regeneration resumes.
    #[must_use]
    pub fn regen_delay(&self) -> Duration {
        seconds(self.regen_delay_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            regen_per_second: 1.0,
            regen_delay_secs: 3.0,
        }
    }
}

/// Stat sheet of the player's automatic weapon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Shots per second before multipliers.
    pub fire_rate: f32,
    /// Damage dealt to every target of a shot before multipliers.
    pub damage_per_shot: f32,
    /// Maximum number of enemies struck by one shot.
    pub max_targets: u32,
    /// Maximum distance to a target.
    pub range: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_rate: 8.0,
            damage_per_shot: 2.0,
            max_targets: 3,
            range: 15.0,
        }
    }
}

/// Combo effect strengths and hand activation rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// Damage multiplier granted by a pair.
    pub pair_damage_multiplier: f32,
    /// Seconds the pair damage multiplier lasts.
    pub pair_duration_secs: f32,
    /// Radius around the player struck by three of a kind.
    pub area_radius: f32,
    /// Damage dealt by three of a kind.
    pub area_damage: f32,
    /// Health restored by a flush.
    pub flush_heal: f32,
    /// Damage dealt to every non-boss enemy by a royal flush.
    pub wipe_damage: f32,
    /// Minimum held chips required to activate a hand.
    pub min_activation_chips: u32,
    /// Seconds between activations before multiplier reductions.
    pub activation_cooldown_secs: f32,
    /// Seconds removed from the cooldown per point of multiplier.
    pub cooldown_reduction_per_multiplier: f32,
}

impl ComboConfig {
    /// Duration of the pair damage multiplier.
    #[must_use]
    pub fn pair_duration(&self) -> Duration {
        seconds(self.pair_duration_secs)
    }

    /// Activation cooldown that follows a combo with the given multiplier.
    #[must_use]
    pub fn cooldown_after(&self, multiplier: u32) -> Duration {
        let reduction = self.cooldown_reduction_per_multiplier * multiplier as f32;
        seconds(self.activation_cooldown_secs - reduction)
    }
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            pair_damage_multiplier: 2.0,
            pair_duration_secs: 6.0,
            area_radius: 6.0,
            area_damage: 40.0,
            flush_heal: 25.0,
            wipe_damage: 9_999.0,
            min_activation_chips: 2,
            activation_cooldown_secs: 10.0,
            cooldown_reduction_per_multiplier: 0.5,
        }
    }
}

/// Stat sheet shared by every enemy spawned from a template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    /// Identifier referenced by spawn tables.
    pub id: TemplateId,
    /// Display name used in logs.
    pub name: String,
    /// Maximum health.
    pub max_health: f32,
    /// Chase speed in world units per second.
    pub move_speed: f32,
    /// Score credited to the run on death.
    pub score_reward: u32,
    /// Probability in `[0, 1]` that a chip drops on death.
    pub chip_drop_chance: f32,
    /// Damage dealt to the player on contact.
    pub contact_damage: f32,
    /// Distance at which the enemy touches the player.
    pub contact_range: f32,
    /// Seconds between two contact hits.
    pub attack_cooldown_secs: f32,
    /// Health regenerated per second once out of combat.
    pub regen_per_second: f32,
    /// Seconds without damage before regeneration resumes.
    pub regen_delay_secs: f32,
    /// Bosses survive the royal flush arena wipe.
    pub is_boss: bool,
}

impl EnemyTemplate {
    /// Chip drop probability clamped into `[0, 1]`.
    #[must_use]
    pub fn drop_chance(&self) -> f32 {
        if self.chip_drop_chance.is_nan() {
            return 0.0;
        }
        self.chip_drop_chance.clamp(0.0, 1.0)
    }

    /// Delay between two contact hits.
    #[must_use]
    pub fn attack_cooldown(&self) -> Duration {
        seconds(self.attack_cooldown_secs)
    }

    /// Delay without damage before regeneration resumes.
    #[must_use]
    pub fn regen_delay(&self) -> Duration {
        seconds(self.regen_delay_secs)
    }
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            id: TemplateId::new(1),
            name: "grunt".to_owned(),
            max_health: 15.0,
            move_speed: 3.0,
            score_reward: 50,
            chip_drop_chance: 1.0,
            contact_damage: 10.0,
            contact_range: 1.0,
            attack_cooldown_secs: 1.0,
            regen_per_second: 0.0,
            regen_delay_secs: 3.0,
            is_boss: false,
        }
    }
}

/// Spawn schedule and composition of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Number shown to players.
    pub wave_number: u32,
    /// Enemies spawned over the whole wave.
    pub total_enemies: u32,
    /// Maximum simultaneously alive enemies.
    pub max_concurrent: u32,
    /// Seconds between two spawn attempts.
    pub spawn_interval_secs: f32,
    /// Weighted enemy composition.
    pub spawn_table: Vec<SpawnEntry>,
}

impl WaveConfig {
    /// Delay between two spawn attempts.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.spawn_interval_secs)
    }

    /// Sum of the weights of entries referencing a known template.
    #[must_use]
    pub fn usable_weight(&self, known: &[TemplateId]) -> f32 {
        self.spawn_table
            .iter()
            .filter(|entry| entry.is_usable(known))
            .map(SpawnEntry::effective_weight)
            .sum()
    }

    /// Checks that the wave can be spawned with the provided templates.
    pub fn validate(&self, known: &[TemplateId]) -> Result<(), ConfigError> {
        let wave = self.wave_number;
        if self.spawn_table.is_empty() {
            return Err(ConfigError::EmptySpawnTable { wave });
        }
        if self.spawn_interval().is_zero() {
            return Err(ConfigError::InvalidSpawnInterval {
                wave,
                interval: self.spawn_interval_secs,
            });
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency { wave });
        }
        let weight = self.usable_weight(known);
        if !weight.is_finite() {
            return Err(ConfigError::NonFiniteSpawnWeight { wave });
        }
        if weight <= 0.0 {
            return Err(ConfigError::ZeroSpawnWeight { wave });
        }
        Ok(())
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            wave_number: 1,
            total_enemies: 5,
            max_concurrent: 3,
            spawn_interval_secs: 2.5,
            spawn_table: vec![SpawnEntry::weighted(TemplateId::new(1), 1.0)],
        }
    }
}

/// One weighted row of a wave's enemy composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnEntry {
    /// Template spawned by the entry. Entries without one are skipped.
    pub template: Option<TemplateId>,
    /// Relative selection weight.
    pub weight: f32,
    /// Minimum count of this type per wave. Informational.
    pub min_count: u32,
    /// Maximum count of this type per wave, zero for no limit.
    pub max_count: u32,
}

impl SpawnEntry {
    /// Creates an uncapped entry for the template with the given weight.
    #[must_use]
    pub fn weighted(template: TemplateId, weight: f32) -> Self {
        Self {
            template: Some(template),
            weight,
            min_count: 0,
            max_count: 0,
        }
    }

    /// Reports whether the entry references one of the known templates.
    #[must_use]
    pub fn is_usable(&self, known: &[TemplateId]) -> bool {
        self.template.is_some_and(|template| known.contains(&template))
    }

    /// Weight used for selection; negative and non-finite weights count as
    /// zero.
    #[must_use]
    pub fn effective_weight(&self) -> f32 {
        if !self.weight.is_finite() {
            return 0.0;
        }
        self.weight.max(0.0)
    }

    /// Number of pooled instances prepared before the wave starts.
    #[must_use]
    pub fn preload_count(&self) -> u32 {
        if self.max_count > 0 {
            self.max_count.saturating_mul(2)
        } else {
            UNCAPPED_PRELOAD
        }
    }
}

impl Default for SpawnEntry {
    fn default() -> Self {
        Self {
            template: None,
            weight: 1.0,
            min_count: 0,
            max_count: 0,
        }
    }
}

/// Converts configured seconds; negative, non-finite and out-of-range values
/// become zero.
fn seconds(value: f32) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}
