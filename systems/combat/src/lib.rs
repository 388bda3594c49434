#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that fires the player's automatic weapon at nearby enemies.

use std::time::Duration;

use pokershot_core::{
    Command, EnemyId, EnemyView, Event, PlayerSnapshot, RunPhase, Vec2, WeaponConfig,
};

/// Automatic weapon that emits `Command::DamageEnemy` for the nearest enemies.
#[derive(Debug)]
pub struct AutoShooter {
    weapon: WeaponConfig,
    since_last_shot: Duration,
    candidates: Vec<Candidate>,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: EnemyId,
    distance_sq: f32,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        self.distance_sq < other.distance_sq
            || (self.distance_sq == other.distance_sq && self.id < other.id)
    }
}

impl AutoShooter {
    /// Creates a shooter for the weapon stat sheet.
    #[must_use]
    pub fn new(weapon: WeaponConfig) -> Self {
        Self {
            weapon,
            since_last_shot: Duration::ZERO,
            candidates: Vec::new(),
        }
    }

    /// Advances the fire timer and shoots once it is ready and a target is in
    /// range. Outside combat phases the timer is held at zero.
    pub fn handle(
        &mut self,
        events: &[Event],
        phase: RunPhase,
        player: Option<&PlayerSnapshot>,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        let Some(player) = player.filter(|player| !player.is_dead) else {
            self.since_last_shot = Duration::ZERO;
            return;
        };
        if !phase.is_combat() {
            self.since_last_shot = Duration::ZERO;
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.since_last_shot = self.since_last_shot.saturating_add(*dt);
            }
        }

        let Some(interval) = self.fire_interval(player.fire_rate_multiplier) else {
            return;
        };
        if self.since_last_shot < interval {
            return;
        }

        self.collect_targets(player.position, enemies);
        if self.candidates.is_empty() {
            return;
        }

        let amount = self.weapon.damage_per_shot * player.damage_multiplier;
        for candidate in &self.candidates {
            out.push(Command::DamageEnemy {
                enemy: candidate.id,
                amount,
            });
        }
        self.since_last_shot = Duration::ZERO;
    }

    fn fire_interval(&self, fire_rate_multiplier: f32) -> Option<Duration> {
        let rate = self.weapon.fire_rate * fire_rate_multiplier;
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f32(1.0 / rate).ok()
    }

    fn collect_targets(&mut self, origin: Vec2, enemies: &EnemyView) {
        self.candidates.clear();
        let range_sq = self.weapon.range * self.weapon.range;
        for enemy in enemies.iter() {
            let distance_sq = enemy.position.distance_squared(origin);
            if distance_sq > range_sq {
                continue;
            }
            self.candidates.push(Candidate {
                id: enemy.id,
                distance_sq,
            });
        }

        self.candidates.sort_by(|a, b| {
            if a.precedes(b) {
                std::cmp::Ordering::Less
            } else if b.precedes(a) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        self.candidates.truncate(self.weapon.max_targets as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokershot_core::{EnemySnapshot, TemplateId};

    fn player() -> PlayerSnapshot {
        PlayerSnapshot {
            position: Vec2::ZERO,
            health: 100.0,
            max_health: 100.0,
            is_dead: false,
            damage_multiplier: 1.0,
            fire_rate_multiplier: 1.0,
            hand_size: 0,
            activation_ready_in: Duration::ZERO,
        }
    }

    fn enemy(id: u32, x: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            template: TemplateId::new(1),
            position: Vec2::new(x, 0.0),
            health: 10.0,
            is_boss: false,
        }
    }

    fn tick(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    fn weapon() -> WeaponConfig {
        WeaponConfig {
            fire_rate: 4.0,
            damage_per_shot: 3.0,
            max_targets: 2,
            range: 10.0,
        }
    }

    #[test]
    fn shop_phase_is_silent() {
        let mut shooter = AutoShooter::new(weapon());
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 1.0)]);
        let mut out = Vec::new();

        shooter.handle(&[tick(1_000)], RunPhase::Shopping, Some(&player()), &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn fires_at_the_nearest_targets_in_range() {
        let mut shooter = AutoShooter::new(weapon());
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, 8.0),
            enemy(2, -2.0),
            enemy(3, 30.0),
            enemy(4, 5.0),
        ]);
        let mut out = Vec::new();

        shooter.handle(&[tick(250)], RunPhase::Playing, Some(&player()), &enemies, &mut out);

        assert_eq!(
            out,
            vec![
                Command::DamageEnemy {
                    enemy: EnemyId::new(2),
                    amount: 3.0,
                },
                Command::DamageEnemy {
                    enemy: EnemyId::new(4),
                    amount: 3.0,
                },
            ]
        );
    }

    #[test]
    fn fire_rate_gates_shots() {
        let mut shooter = AutoShooter::new(weapon());
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 1.0)]);
        let mut out = Vec::new();

        shooter.handle(&[tick(100)], RunPhase::Playing, Some(&player()), &enemies, &mut out);
        assert!(out.is_empty());
        shooter.handle(&[tick(150)], RunPhase::Playing, Some(&player()), &enemies, &mut out);
        assert_eq!(out.len(), 1);
        shooter.handle(&[tick(100)], RunPhase::Playing, Some(&player()), &enemies, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn multipliers_scale_damage_and_rate() {
        let mut shooter = AutoShooter::new(weapon());
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 1.0)]);
        let boosted = PlayerSnapshot {
            damage_multiplier: 2.0,
            fire_rate_multiplier: 2.0,
            ..player()
        };
        let mut out = Vec::new();

        shooter.handle(&[tick(125)], RunPhase::BossFight, Some(&boosted), &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::DamageEnemy {
                enemy: EnemyId::new(1),
                amount: 6.0,
            }]
        );
    }

    #[test]
    fn dead_or_missing_players_do_not_shoot() {
        let mut shooter = AutoShooter::new(weapon());
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 1.0)]);
        let dead = PlayerSnapshot {
            is_dead: true,
            ..player()
        };
        let mut out = Vec::new();

        shooter.handle(&[tick(1_000)], RunPhase::Playing, Some(&dead), &enemies, &mut out);
        shooter.handle(&[tick(1_000)], RunPhase::Playing, None, &enemies, &mut out);

        assert!(out.is_empty());
    }
}
