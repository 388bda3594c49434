//! Entities living in the arena and the factories that build them.

use std::{collections::BTreeMap, time::Duration};

use pokershot_core::{
    Card, ChipId, EnemyId, EnemySnapshot, EnemyTemplate, PlayerConfig, PlayerSnapshot, Rank, Suit,
    TemplateId, Vec2,
};

use crate::{
    hand::Hand,
    health::Health,
    pool::{Factory, Pooled},
};

/// Enemy instance built from a template.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) template: TemplateId,
    pub(crate) is_boss: bool,
    pub(crate) position: Vec2,
    pub(crate) health: Health,
    pub(crate) move_speed: f32,
    pub(crate) contact_damage: f32,
    pub(crate) contact_range: f32,
    pub(crate) attack_cooldown: Duration,
    pub(crate) attack_ready_at: Duration,
    pub(crate) score_reward: u32,
    pub(crate) drop_chance: f32,
}

impl Enemy {
    fn from_template(id: EnemyId, template: &EnemyTemplate) -> Self {
        Self {
            id,
            template: template.id,
            is_boss: template.is_boss,
            position: Vec2::ZERO,
            health: Health::new(
                template.max_health,
                template.regen_per_second,
                template.regen_delay(),
            ),
            move_speed: template.move_speed.max(0.0),
            contact_damage: template.contact_damage,
            contact_range: template.contact_range.max(0.0),
            attack_cooldown: template.attack_cooldown(),
            attack_ready_at: Duration::ZERO,
            score_reward: template.score_reward,
            drop_chance: template.drop_chance(),
        }
    }

    /// Places a pooled enemy in the arena for a new lifecycle.
    pub(crate) fn enter(&mut self, position: Vec2, now: Duration) {
        self.health.reset();
        self.position = position;
        self.attack_ready_at = now;
    }

    /// Moves toward `target`, stopping at contact range.
    pub(crate) fn chase(&mut self, target: Vec2, dt: Duration) {
        let offset = target - self.position;
        let distance = offset.length();
        let gap = distance - self.contact_range;
        if gap <= 0.0 {
            return;
        }
        let step = (self.move_speed * dt.as_secs_f32()).min(gap);
        self.position += offset.normalize_or_zero() * step;
    }

    /// Strikes the target if it is in reach and the attack is ready,
    /// returning the damage dealt.
    pub(crate) fn try_contact(&mut self, target: Vec2, now: Duration) -> Option<f32> {
        if self.contact_damage <= 0.0 || now < self.attack_ready_at {
            return None;
        }
        if self.position.distance(target) > self.contact_range {
            return None;
        }
        self.attack_ready_at = now + self.attack_cooldown;
        Some(self.contact_damage)
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            template: self.template,
            position: self.position,
            health: self.health.current(),
            is_boss: self.is_boss,
        }
    }
}

impl Pooled for Enemy {
    type Id = EnemyId;
    type Template = TemplateId;

    fn id(&self) -> EnemyId {
        self.id
    }

    fn template(&self) -> Option<TemplateId> {
        Some(self.template)
    }

    fn reset(&mut self) {
        self.health.reset();
        self.position = Vec2::ZERO;
        self.attack_ready_at = Duration::ZERO;
    }
}

/// Builds enemies from the configured stat sheets.
#[derive(Debug)]
pub(crate) struct EnemyFactory {
    templates: BTreeMap<TemplateId, EnemyTemplate>,
    next_id: u32,
}

impl EnemyFactory {
    pub(crate) fn new(templates: &[EnemyTemplate]) -> Self {
        Self {
            templates: templates
                .iter()
                .map(|template| (template.id, template.clone()))
                .collect(),
            next_id: 0,
        }
    }
}

impl Factory<Enemy> for EnemyFactory {
    fn instantiate(&mut self, template: TemplateId) -> Option<Enemy> {
        let template = self.templates.get(&template)?;
        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Some(Enemy::from_template(id, template))
    }
}

/// Pickup carrying one card.
#[derive(Clone, Debug)]
pub(crate) struct Chip {
    pub(crate) id: ChipId,
    pub(crate) card: Card,
    pub(crate) position: Vec2,
}

impl Pooled for Chip {
    type Id = ChipId;
    type Template = ();

    fn id(&self) -> ChipId {
        self.id
    }

    fn template(&self) -> Option<()> {
        Some(())
    }

    fn reset(&mut self) {
        self.position = Vec2::ZERO;
    }
}

/// Builds blank chips; cards are assigned when a chip drops.
#[derive(Debug, Default)]
pub(crate) struct ChipFactory {
    next_id: u32,
}

impl Factory<Chip> for ChipFactory {
    fn instantiate(&mut self, _template: ()) -> Option<Chip> {
        let id = ChipId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Some(Chip {
            id,
            card: Card::new(Rank::Two, Suit::Clubs),
            position: Vec2::ZERO,
        })
    }
}

/// The player-controlled entity.
#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) generation: u32,
    pub(crate) position: Vec2,
    pub(crate) health: Health,
    pub(crate) hand: Hand<Chip>,
    pub(crate) damage_multiplier: f32,
    pub(crate) fire_rate_multiplier: f32,
    pub(crate) activation_ready_at: Duration,
}

impl Player {
    pub(crate) fn new(generation: u32, position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            generation,
            position,
            health: Health::new(
                config.max_health,
                config.regen_per_second,
                config.regen_delay(),
            ),
            hand: Hand::new(),
            damage_multiplier: 1.0,
            fire_rate_multiplier: 1.0,
            activation_ready_at: Duration::ZERO,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    pub(crate) fn snapshot(&self, now: Duration) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            health: self.health.current(),
            max_health: self.health.max(),
            is_dead: self.health.is_dead(),
            damage_multiplier: self.damage_multiplier,
            fire_rate_multiplier: self.fire_rate_multiplier,
            hand_size: self.hand.len(),
            activation_ready_in: self.activation_ready_at.saturating_sub(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grunt() -> EnemyTemplate {
        EnemyTemplate {
            contact_range: 1.0,
            move_speed: 2.0,
            ..EnemyTemplate::default()
        }
    }

    #[test]
    fn chase_stops_at_contact_range() {
        let mut enemy = Enemy::from_template(EnemyId::new(0), &grunt());
        enemy.enter(Vec2::new(5.0, 0.0), Duration::ZERO);

        enemy.chase(Vec2::ZERO, Duration::from_secs(1));
        assert!((enemy.position.x - 3.0).abs() < 1e-5);

        enemy.chase(Vec2::ZERO, Duration::from_secs(10));
        assert!((enemy.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn contact_respects_the_attack_cooldown() {
        let mut enemy = Enemy::from_template(EnemyId::new(0), &grunt());
        enemy.enter(Vec2::new(0.5, 0.0), Duration::ZERO);

        assert_eq!(enemy.try_contact(Vec2::ZERO, Duration::ZERO), Some(10.0));
        assert_eq!(enemy.try_contact(Vec2::ZERO, Duration::from_millis(500)), None);
        assert_eq!(enemy.try_contact(Vec2::ZERO, Duration::from_secs(1)), Some(10.0));
        assert_eq!(enemy.try_contact(Vec2::new(9.0, 0.0), Duration::from_secs(5)), None);
    }

    #[test]
    fn factory_only_builds_known_templates() {
        let mut factory = EnemyFactory::new(&[grunt()]);
        let first = factory.instantiate(TemplateId::new(1)).expect("known template");
        let second = factory.instantiate(TemplateId::new(1)).expect("known template");

        assert_ne!(first.id, second.id);
        assert!(factory.instantiate(TemplateId::new(77)).is_none());
    }
}
