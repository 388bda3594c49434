//! Damage, healing and death bookkeeping shared by the player and enemies.

use std::time::Duration;

use thiserror::Error;

/// Rejected health mutations.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum HealthError {
    /// Maximum health must be positive and finite.
    #[error("max health must be positive, got {0}")]
    InvalidMaxHealth(f32),
    /// Only dead entities can be revived.
    #[error("entity is alive")]
    NotDead,
}

/// Damage that was actually applied by [`Health::take_damage`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Damage {
    /// Health removed after clamping at zero.
    pub applied: f32,
    /// Whether this hit moved the entity to the dead state.
    pub died: bool,
}

/// Health pool with a monotonic death flag and delayed regeneration.
#[derive(Clone, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
    dead: bool,
    last_damage_at: Option<Duration>,
    regen_per_second: f32,
    regen_delay: Duration,
}

impl Health {
    /// Creates a full health pool. `max` is expected to be validated by the
    /// caller's configuration.
    #[must_use]
    pub fn new(max: f32, regen_per_second: f32, regen_delay: Duration) -> Self {
        Self {
            current: max,
            max,
            dead: false,
            last_damage_at: None,
            regen_per_second,
            regen_delay,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Whether the entity is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Simulation time of the most recent applied damage.
    #[must_use]
    pub const fn last_damage_at(&self) -> Option<Duration> {
        self.last_damage_at
    }

    /// Removes health. Returns `None` when nothing was applied because the
    /// entity is dead or the amount is not positive.
    pub fn take_damage(&mut self, amount: f32, now: Duration) -> Option<Damage> {
        if self.dead || !(amount > 0.0) {
            return None;
        }

        let applied = amount.min(self.current);
        self.current -= applied;
        self.last_damage_at = Some(now);

        let died = self.current <= 0.0;
        if died {
            self.current = 0.0;
            self.dead = true;
        }
        Some(Damage { applied, died })
    }

    /// Restores health up to the maximum, returning the amount gained.
    pub fn heal(&mut self, amount: f32) -> Option<f32> {
        if self.dead || !(amount > 0.0) {
            return None;
        }

        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        let gained = self.current - before;
        (gained > 0.0).then_some(gained)
    }

    /// Replaces the maximum, clamping current health down to it.
    pub fn set_max(&mut self, max: f32) -> Result<(), HealthError> {
        if !max.is_finite() || max <= 0.0 {
            return Err(HealthError::InvalidMaxHealth(max));
        }
        self.max = max;
        self.current = self.current.min(max);
        Ok(())
    }

    /// Applies passive regeneration for a tick of length `dt` ending at
    /// `now`. Nothing happens until the regeneration delay has passed since
    /// the last damage.
    pub fn regenerate(&mut self, dt: Duration, now: Duration) -> Option<f32> {
        if self.dead || !(self.regen_per_second > 0.0) || self.current >= self.max {
            return None;
        }
        if let Some(hit_at) = self.last_damage_at {
            if now.saturating_sub(hit_at) <= self.regen_delay {
                return None;
            }
        }
        self.heal(self.regen_per_second * dt.as_secs_f32())
    }

    /// Moves the entity to the dead state. Returns `false` if it was already
    /// dead.
    pub fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.current = 0.0;
        self.dead = true;
        true
    }

    /// Brings a dead entity back with `amount` health clamped into
    /// `[1, max]`, returning the restored health.
    pub fn revive(&mut self, amount: f32) -> Result<f32, HealthError> {
        if !self.dead {
            return Err(HealthError::NotDead);
        }
        self.current = amount.max(1.0).min(self.max);
        self.dead = false;
        self.last_damage_at = None;
        Ok(self.current)
    }

    /// Restores the pool to full for a new lifecycle.
    pub fn reset(&mut self) {
        self.current = self.max;
        self.dead = false;
        self.last_damage_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(max: f32) -> Health {
        Health::new(max, 10.0, Duration::from_secs(3))
    }

    #[test]
    fn overkill_reports_the_health_actually_removed() {
        let mut health = health(30.0);
        let damage = health.take_damage(50.0, Duration::ZERO);

        assert_eq!(
            damage,
            Some(Damage {
                applied: 30.0,
                died: true
            })
        );
        assert_eq!(health.current(), 0.0);
        assert!(health.is_dead());
        assert_eq!(health.take_damage(5.0, Duration::from_secs(1)), None);
    }

    #[test]
    fn non_positive_amounts_are_ignored() {
        let mut health = health(30.0);
        assert_eq!(health.take_damage(0.0, Duration::ZERO), None);
        assert_eq!(health.take_damage(-4.0, Duration::ZERO), None);
        assert_eq!(health.take_damage(f32::NAN, Duration::ZERO), None);
        assert_eq!(health.heal(-1.0), None);
        assert_eq!(health.last_damage_at(), None);
    }

    #[test]
    fn heal_clamps_at_max() {
        let mut health = health(30.0);
        let _ = health.take_damage(5.0, Duration::ZERO);

        assert_eq!(health.heal(20.0), Some(5.0));
        assert_eq!(health.heal(20.0), None);
        assert_eq!(health.current(), 30.0);
    }

    #[test]
    fn dead_entities_cannot_heal() {
        let mut health = health(10.0);
        assert!(health.die());
        assert!(!health.die());
        assert_eq!(health.heal(5.0), None);
    }

    #[test]
    fn set_max_rejects_non_positive_values() {
        let mut health = health(30.0);
        assert_eq!(health.set_max(0.0), Err(HealthError::InvalidMaxHealth(0.0)));
        assert_eq!(health.max(), 30.0);

        assert_eq!(health.set_max(12.0), Ok(()));
        assert_eq!(health.current(), 12.0);
    }

    #[test]
    fn regeneration_waits_for_the_delay() {
        let mut health = health(30.0);
        let _ = health.take_damage(20.0, Duration::from_secs(1));

        let step = Duration::from_millis(500);
        let mut now = Duration::from_secs(1);
        while now <= Duration::from_secs(4) {
            assert_eq!(health.regenerate(step, now), None, "regenerated at {now:?}");
            now += step;
        }

        let mut previous = health.current();
        for _ in 0..20 {
            let _ = health.regenerate(step, now);
            assert!(health.current() >= previous);
            assert!(health.current() <= health.max());
            previous = health.current();
            now += step;
        }
        assert_eq!(health.current(), 30.0);
    }

    #[test]
    fn untouched_entities_regenerate_immediately() {
        let mut health = health(30.0);
        assert!(health.set_max(40.0).is_ok());
        let gained = health
            .regenerate(Duration::from_millis(100), Duration::ZERO)
            .expect("no damage recorded yet");
        assert!((gained - 1.0).abs() < 1e-4);
    }

    #[test]
    fn revive_clamps_into_range() {
        let mut health = health(30.0);
        assert_eq!(health.revive(10.0), Err(HealthError::NotDead));

        assert!(health.die());
        assert_eq!(health.revive(0.0), Ok(1.0));
        assert!(health.die());
        assert_eq!(health.revive(500.0), Ok(30.0));
        assert!(!health.is_dead());
    }

    #[test]
    fn reset_restores_a_full_lifecycle() {
        let mut health = health(30.0);
        let _ = health.take_damage(30.0, Duration::from_secs(2));
        health.reset();

        assert_eq!(health.current(), 30.0);
        assert!(!health.is_dead());
        assert_eq!(health.last_damage_at(), None);
    }
}
