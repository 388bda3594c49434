//! Live-enemy population tracking for the active wave.

use std::collections::BTreeSet;

use pokershot_core::EnemyId;
use thiserror::Error;
use tracing::debug;

use crate::health::Health;

/// Reasons an enemy registration is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TrackError {
    /// No wave is being tracked.
    #[error("no wave is active")]
    Inactive,
    /// The enemy is already a member of the wave.
    #[error("enemy {0:?} is already registered")]
    Duplicate(EnemyId),
    /// The enemy has no living health to watch.
    #[error("enemy {0:?} is dead")]
    Dead(EnemyId),
}

/// Outcome of a death notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathNotice {
    /// The enemy was not a member of the active wave.
    Stale,
    /// The enemy was counted and others remain or are still to spawn.
    Counted {
        /// Members still alive.
        remaining: u32,
    },
    /// The enemy was the last one the wave was waiting for.
    WaveCompleted {
        /// Number of the completed wave.
        wave: u32,
    },
}

/// Correction applied by [`WaveTracker::reconcile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resync {
    /// Count held before the correction.
    pub tracked: u32,
    /// Count of members that are actually alive.
    pub actual: u32,
}

/// Authoritative live-enemy counter and membership registry.
#[derive(Debug, Default)]
pub struct WaveTracker {
    wave: u32,
    active: bool,
    live: u32,
    expected: u32,
    registered: u32,
    members: BTreeSet<EnemyId>,
}

impl WaveTracker {
    /// Creates an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens tracking for a wave that will spawn `expected` enemies.
    pub fn start_wave(&mut self, wave: u32, expected: u32) {
        self.members.clear();
        self.wave = wave;
        self.active = true;
        self.live = 0;
        self.expected = expected;
        self.registered = 0;
    }

    /// Registers a freshly spawned enemy.
    pub fn enemy_spawned(&mut self, enemy: EnemyId, health: &Health) -> Result<(), TrackError> {
        if !self.active {
            return Err(TrackError::Inactive);
        }
        if health.is_dead() {
            return Err(TrackError::Dead(enemy));
        }
        if !self.members.insert(enemy) {
            return Err(TrackError::Duplicate(enemy));
        }
        self.live += 1;
        self.registered = self.registered.saturating_add(1);
        Ok(())
    }

    /// Forgets an enemy that left the arena without dying.
    pub fn enemy_returned(&mut self, enemy: EnemyId) -> bool {
        self.members.remove(&enemy)
    }

    /// Counts a member's death, completing the wave once nothing is left.
    pub fn enemy_died(&mut self, enemy: EnemyId) -> DeathNotice {
        if !self.members.remove(&enemy) {
            debug!(?enemy, wave = self.wave, "ignored death of an untracked enemy");
            return DeathNotice::Stale;
        }
        self.live = self.live.saturating_sub(1);
        match self.poll_completion() {
            Some(wave) => DeathNotice::WaveCompleted { wave },
            None => DeathNotice::Counted {
                remaining: self.live,
            },
        }
    }

    /// Completes the wave if it is active, drained and fully registered.
    pub fn poll_completion(&mut self) -> Option<u32> {
        if self.active && self.live == 0 && self.registered >= self.expected {
            self.active = false;
            return Some(self.wave);
        }
        None
    }

    /// Completes a drained wave even if fewer enemies than expected were
    /// registered.
    pub fn finish_drained(&mut self) -> Option<u32> {
        if self.active && self.live == 0 {
            self.active = false;
            return Some(self.wave);
        }
        None
    }

    /// Realigns the live count with the members that are actually alive.
    pub fn reconcile(&mut self, is_alive: impl Fn(EnemyId) -> bool) -> Option<Resync> {
        self.members.retain(|enemy| is_alive(*enemy));
        let actual = self.members.len() as u32;
        if actual == self.live {
            return None;
        }
        let resync = Resync {
            tracked: self.live,
            actual,
        };
        self.live = actual;
        Some(resync)
    }

    /// Abandons the wave, returning its number if one was active.
    pub fn abort(&mut self) -> Option<u32> {
        self.members.clear();
        self.live = 0;
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.wave)
    }

    /// Number of the wave most recently started.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Whether a wave is being tracked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Members currently alive.
    #[must_use]
    pub const fn live(&self) -> u32 {
        self.live
    }

    /// Whether the enemy is a member of the active wave.
    #[must_use]
    pub fn is_tracked(&self, enemy: EnemyId) -> bool {
        self.members.contains(&enemy)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn alive() -> Health {
        Health::new(10.0, 0.0, Duration::ZERO)
    }

    #[test]
    fn registrations_require_an_active_wave() {
        let mut tracker = WaveTracker::new();
        assert_eq!(
            tracker.enemy_spawned(EnemyId::new(1), &alive()),
            Err(TrackError::Inactive)
        );
    }

    #[test]
    fn duplicate_and_dead_registrations_are_refused() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(1, 3);
        assert_eq!(tracker.enemy_spawned(EnemyId::new(1), &alive()), Ok(()));
        assert_eq!(
            tracker.enemy_spawned(EnemyId::new(1), &alive()),
            Err(TrackError::Duplicate(EnemyId::new(1)))
        );

        let mut dead = alive();
        assert!(dead.die());
        assert_eq!(
            tracker.enemy_spawned(EnemyId::new(2), &dead),
            Err(TrackError::Dead(EnemyId::new(2)))
        );
        assert_eq!(tracker.live(), 1);
    }

    #[test]
    fn wave_completes_once_every_expected_enemy_died() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(4, 2);

        assert_eq!(tracker.enemy_spawned(EnemyId::new(1), &alive()), Ok(()));
        assert_eq!(
            tracker.enemy_died(EnemyId::new(1)),
            DeathNotice::Counted { remaining: 0 },
            "a drained population does not end a wave that still has spawns pending"
        );
        assert!(tracker.is_active());

        assert_eq!(tracker.enemy_spawned(EnemyId::new(2), &alive()), Ok(()));
        assert_eq!(
            tracker.enemy_died(EnemyId::new(2)),
            DeathNotice::WaveCompleted { wave: 4 }
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn stale_deaths_are_ignored() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(1, 1);
        assert_eq!(tracker.enemy_spawned(EnemyId::new(1), &alive()), Ok(()));

        assert_eq!(tracker.enemy_died(EnemyId::new(9)), DeathNotice::Stale);
        assert_eq!(
            tracker.enemy_died(EnemyId::new(1)),
            DeathNotice::WaveCompleted { wave: 1 }
        );
        assert_eq!(tracker.enemy_died(EnemyId::new(1)), DeathNotice::Stale);
    }

    #[test]
    fn returned_enemies_are_unregistered_without_counting() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(1, 2);
        assert_eq!(tracker.enemy_spawned(EnemyId::new(1), &alive()), Ok(()));

        assert!(tracker.enemy_returned(EnemyId::new(1)));
        assert!(!tracker.is_tracked(EnemyId::new(1)));
        assert_eq!(tracker.live(), 1);
        assert_eq!(tracker.enemy_died(EnemyId::new(1)), DeathNotice::Stale);

        assert_eq!(
            tracker.reconcile(|_| true),
            Some(Resync {
                tracked: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn reconcile_drops_members_that_died_unnoticed() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(1, 3);
        for id in 1..=3 {
            assert_eq!(tracker.enemy_spawned(EnemyId::new(id), &alive()), Ok(()));
        }

        assert_eq!(tracker.reconcile(|_| true), None);
        assert_eq!(
            tracker.reconcile(|enemy| enemy.get() != 2),
            Some(Resync {
                tracked: 3,
                actual: 2
            })
        );
        assert_eq!(tracker.live(), 2);
        assert_eq!(tracker.poll_completion(), None);
    }

    #[test]
    fn drained_waves_can_be_finished_early() {
        let mut tracker = WaveTracker::new();
        tracker.start_wave(2, 5);
        assert_eq!(tracker.poll_completion(), None);
        assert_eq!(tracker.finish_drained(), Some(2));
        assert_eq!(tracker.finish_drained(), None);
    }

    #[test]
    fn abort_reports_only_active_waves() {
        let mut tracker = WaveTracker::new();
        assert_eq!(tracker.abort(), None);

        tracker.start_wave(3, 2);
        assert_eq!(tracker.enemy_spawned(EnemyId::new(1), &alive()), Ok(()));
        assert_eq!(tracker.abort(), Some(3));
        assert_eq!(tracker.live(), 0);
        assert!(!tracker.is_active());
    }
}
