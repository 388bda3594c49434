#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the PokerShot simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! in the order they happened. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod cards;
mod config;

pub use cards::{Card, HandResult, HandType, Rank, Suit, HAND_SIZE};
pub use config::{
    ArenaConfig, ComboConfig, ConfigError, EnemyTemplate, GameConfig, PlayerConfig, SpawnEntry,
    WaveConfig, WeaponConfig, DEFAULT_SEED, UNCAPPED_PRELOAD,
};
pub use glam::Vec2;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to PokerShot.";

/// Phases of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// No wave has been launched yet.
    Preparing,
    /// A normal wave is in progress.
    Playing,
    /// Between waves, waiting for the player to move on.
    Shopping,
    /// The boss wave is in progress.
    BossFight,
    /// The player died. Terminal.
    GameOver,
    /// The boss wave was cleared. Terminal.
    Victory,
}

impl RunPhase {
    /// Reports whether the phase ends the run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }

    /// Reports whether enemies are being fought in this phase.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(self, Self::Playing | Self::BossFight)
    }
}

/// Gameplay consequence of activating a scored hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComboEffect {
    /// Temporarily scales the player's weapon damage.
    DamageBoost {
        /// Factor applied to the damage multiplier.
        multiplier: f32,
        /// Time after which the factor is reverted.
        duration: Duration,
    },
    /// Damages every enemy within a radius of the player.
    AreaDamage {
        /// Radius around the player.
        radius: f32,
        /// Damage dealt to each enemy in range.
        damage: f32,
    },
    /// Restores player health.
    Heal {
        /// Health restored before clamping.
        amount: f32,
    },
    /// Damages every non-boss enemy in the arena.
    ArenaWipe {
        /// Damage dealt to each enemy.
        damage: f32,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Resets score and wave counters and launches the first wave.
    StartRun,
    /// Leaves the shop and launches the next wave or the boss wave.
    AdvanceWave,
    /// Forces the run into its lost terminal phase.
    GameOver,
    /// Opens live-enemy tracking for the wave the spawner just started.
    BeginWave {
        /// Enemies the spawner will emit over the whole wave.
        expected_enemies: u32,
    },
    /// Prepares pooled enemies ahead of a wave.
    PreloadEnemies {
        /// Template to prepare instances for.
        template: TemplateId,
        /// Number of idle instances the pool should hold afterwards.
        count: u32,
    },
    /// Requests that an enemy be taken from the pool and placed in the arena.
    SpawnEnemy {
        /// Template of the enemy.
        template: TemplateId,
        /// Spawn point the enemy enters at.
        position: Vec2,
    },
    /// Reports that the spawner emitted every enemy and the arena is clear.
    CompleteWave,
    /// Updates the player's position sample.
    MovePlayer {
        /// New position of the player.
        position: Vec2,
    },
    /// Applies weapon damage to an enemy.
    DamageEnemy {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage requested before clamping.
        amount: f32,
    },
    /// Places a chip in the arena.
    DropChip {
        /// Where the chip lands.
        position: Vec2,
        /// Card carried by the chip, random when absent.
        card: Option<Card>,
    },
    /// Scores the held hand and releases its chips.
    ActivateHand,
    /// Applies a scored hand's combo.
    ApplyCombo {
        /// Scored hand.
        result: HandResult,
        /// Effect resolved for the hand, if any.
        effect: Option<ComboEffect>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A new run replaced whatever came before it.
    RunStarted,
    /// The run moved between phases.
    PhaseChanged {
        /// Phase before the transition.
        from: RunPhase,
        /// Phase after the transition.
        to: RunPhase,
    },
    /// The wave counter changed.
    WaveChanged {
        /// New wave number, starting at one.
        wave: u32,
    },
    /// A wave configuration was selected and should be spawned.
    WaveScheduled {
        /// Wave number, starting at one.
        wave: u32,
        /// Configuration to spawn.
        config: WaveConfig,
    },
    /// An attempt to leave the shop was made from another phase.
    WaveAdvanceRejected {
        /// Phase the run was in.
        phase: RunPhase,
    },
    /// Live-enemy tracking opened for a wave.
    WaveStarted {
        /// Wave number.
        wave: u32,
    },
    /// Every tracked enemy of the wave died.
    WaveCompleted {
        /// Wave number.
        wave: u32,
    },
    /// The wave was abandoned without completing.
    WaveAborted {
        /// Wave number.
        wave: u32,
    },
    /// The run score changed.
    ScoreChanged {
        /// New total score.
        score: u32,
    },
    /// An enemy entered the arena.
    EnemySpawned {
        /// Identifier of the pooled instance.
        enemy: EnemyId,
        /// Template the enemy was built from.
        template: TemplateId,
        /// Spawn position.
        position: Vec2,
    },
    /// A spawn request could not be honoured.
    EnemySpawnRejected {
        /// Requested template.
        template: TemplateId,
        /// Reason the request failed.
        reason: SpawnRejection,
    },
    /// An enemy lost health.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Health actually removed.
        amount: f32,
    },
    /// An enemy regained health.
    EnemyHealed {
        /// Enemy that healed.
        enemy: EnemyId,
        /// Health actually restored.
        amount: f32,
    },
    /// An enemy's health reached zero.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Template the enemy was built from.
        template: TemplateId,
        /// Where the enemy died.
        position: Vec2,
    },
    /// An enemy instance went back to its pool.
    EnemyReturned {
        /// Returned enemy.
        enemy: EnemyId,
    },
    /// A chip landed in the arena.
    ChipDropped {
        /// Identifier of the pooled chip.
        chip: ChipId,
        /// Card carried by the chip.
        card: Card,
        /// Landing position.
        position: Vec2,
    },
    /// The player collected a chip.
    ChipCollected {
        /// Collected chip.
        chip: ChipId,
        /// Card carried by the chip.
        card: Card,
        /// Oldest card evicted from a full hand, if any.
        discarded: Option<Card>,
    },
    /// The number of held chips changed.
    HandChanged {
        /// Number of chips now held.
        size: usize,
    },
    /// The held hand was activated and released.
    HandActivated {
        /// Cards that were held.
        cards: Vec<Card>,
    },
    /// A hand activation request was refused.
    ActivationRejected {
        /// Reason the request was refused.
        reason: ActivationError,
    },
    /// A combo was applied. Consumed by presentation layers.
    ComboActivated {
        /// Category of the scored hand.
        hand_type: HandType,
        /// Multiplier of the scored hand.
        multiplier: u32,
        /// Name of the category.
        label: &'static str,
    },
    /// The player's damage multiplier was scaled.
    DamageBoostApplied {
        /// Factor applied.
        multiplier: f32,
        /// Time until the factor is reverted.
        duration: Duration,
    },
    /// A temporary damage factor was reverted.
    DamageBoostExpired {
        /// Factor removed.
        multiplier: f32,
    },
    /// The player lost health.
    PlayerDamaged {
        /// Health actually removed.
        amount: f32,
    },
    /// The player regained health.
    PlayerHealed {
        /// Health actually restored.
        amount: f32,
    },
    /// The player's health changed. Consumed by the HUD.
    HealthChanged {
        /// Current health.
        current: f32,
        /// Maximum health.
        max: f32,
    },
    /// The player's health reached zero.
    PlayerDied,
}

/// Reasons a spawn request is refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnRejection {
    /// No wave is currently tracking enemies.
    NoActiveWave,
    /// The template is not part of the enemy catalogue.
    UnknownTemplate,
    /// The wave tracker refused to register the instance.
    NotTracked,
}

/// Reasons a hand activation is refused.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ActivationError {
    /// Too few chips are held.
    #[error("{held} chips held, {required} required")]
    NotEnoughChips {
        /// Chips currently held.
        held: usize,
        /// Chips required.
        required: usize,
    },
    /// The previous activation's cooldown has not elapsed.
    #[error("activation ready in {remaining:?}")]
    CoolingDown {
        /// Time left on the cooldown.
        remaining: Duration,
    },
    /// No player exists to hold a hand.
    #[error("no player in the arena")]
    NoPlayer,
}

/// Unique identifier assigned to a pooled enemy instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a pooled chip instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipId(u32);

impl ChipId {
    /// Creates a new chip identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an enemy template; also keys the enemy sub-pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the instance.
    pub id: EnemyId,
    /// Template the enemy was built from.
    pub template: TemplateId,
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Whether the template is a boss.
    pub is_boss: bool,
}

/// Read-only snapshot describing all enemies within the arena.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether the player is dead.
    pub is_dead: bool,
    /// Factor applied to weapon damage.
    pub damage_multiplier: f32,
    /// Factor applied to weapon fire rate.
    pub fire_rate_multiplier: f32,
    /// Number of chips held.
    pub hand_size: usize,
    /// Time until a hand may be activated again.
    pub activation_ready_in: Duration,
}

#[cfg(test)]
mod tests {
    use super::{Card, GameConfig, HandResult, HandType, Rank, RunPhase, Suit, TemplateId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn game_config_round_trips_through_bincode() {
        assert_round_trip(&GameConfig::default());
    }

    #[test]
    fn card_round_trips_through_bincode() {
        assert_round_trip(&Card::new(Rank::Queen, Suit::Diamonds));
    }

    #[test]
    fn template_id_round_trips_through_bincode() {
        assert_round_trip(&TemplateId::new(42));
    }

    #[test]
    fn hand_types_are_ordered_by_strength() {
        assert!(HandType::RoyalFlush > HandType::StraightFlush);
        assert!(HandType::FullHouse > HandType::Flush);
        assert!(HandType::TwoPair > HandType::Pair);
        assert_eq!(HandType::Pair.multiplier(), HandType::TwoPair.multiplier());
    }

    #[test]
    fn hand_result_describes_its_category() {
        let result = HandResult::of(HandType::FullHouse);
        assert_eq!(result.multiplier, 6);
        assert_eq!(result.label, "Full House");
        assert_eq!(result.to_string(), "Full House (x6)");
    }

    #[test]
    fn card_display_uses_rank_and_suit_glyphs() {
        assert_eq!(Card::new(Rank::Ten, Suit::Spades).to_string(), "T♠");
        assert_eq!(Card::new(Rank::Two, Suit::Hearts).to_string(), "2♥");
    }

    #[test]
    fn rank_values_cover_two_through_ace() {
        assert_eq!(Rank::from_value(14), Some(Rank::Ace));
        assert_eq!(Rank::from_value(2), Some(Rank::Two));
        assert_eq!(Rank::from_value(1), None);
        assert_eq!(Rank::Ace.value(), 14);
    }

    #[test]
    fn terminal_phases_are_not_combat_phases() {
        for phase in [RunPhase::GameOver, RunPhase::Victory] {
            assert!(phase.is_terminal());
            assert!(!phase.is_combat());
        }
        assert!(RunPhase::BossFight.is_combat());
        assert!(!RunPhase::Shopping.is_terminal());
    }
}
