#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for PokerShot.

mod arena;
pub mod hand;
pub mod health;
pub mod pool;
pub mod run;
pub mod timers;
pub mod tracker;

use std::{collections::BTreeMap, time::Duration};

use pokershot_core::{
    ActivationError, Card, ChipId, ComboEffect, Command, ConfigError, EnemyId, Event, GameConfig,
    HandResult, Rank, RunPhase, SpawnRejection, Suit, TemplateId, Vec2, WELCOME_BANNER,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use arena::{Chip, ChipFactory, Enemy, EnemyFactory, Player};
use pool::{ObjectPool, Release};
use run::{RunController, WaveLaunch};
use timers::{TimerAction, TimerOwner, TimerQueue};
use tracker::{DeathNotice, WaveTracker};

/// Random stream used by the world; systems derive their own streams from the
/// same seed.
pub const WORLD_RNG_STREAM: u64 = 0;

/// Represents the authoritative PokerShot world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    clock: Duration,
    rng: ChaCha8Rng,
    run: RunController,
    tracker: WaveTracker,
    enemy_pool: ObjectPool<Enemy, EnemyFactory>,
    chip_pool: ObjectPool<Chip, ChipFactory>,
    enemies: BTreeMap<EnemyId, Enemy>,
    chips: BTreeMap<ChipId, Chip>,
    player: Option<Player>,
    player_generation: u32,
    timers: TimerQueue,
}

impl World {
    /// Creates a world for the validated configuration. Nothing is built when
    /// validation fails.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(WORLD_RNG_STREAM);

        let mut chip_pool = ObjectPool::new("chips", ChipFactory::default());
        if let Err(error) = chip_pool.preload((), config.arena.chip_pool_size) {
            warn!(%error, "chip preload failed");
        }

        Ok(Self {
            banner: WELCOME_BANNER,
            run: RunController::new(config.waves.clone(), config.boss_wave.clone()),
            tracker: WaveTracker::new(),
            enemy_pool: ObjectPool::new("enemies", EnemyFactory::new(&config.enemy_templates)),
            chip_pool,
            enemies: BTreeMap::new(),
            chips: BTreeMap::new(),
            player: None,
            player_generation: 0,
            timers: TimerQueue::new(),
            clock: Duration::ZERO,
            rng,
            config,
        })
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        self.fire_due_timers(out_events);
        self.regenerate(dt, out_events);
        self.advance_enemies(dt, out_events);
        self.attract_chips(dt, out_events);
        self.reconcile_population(out_events);
    }

    fn fire_due_timers(&mut self, out_events: &mut Vec<Event>) {
        for timer in self.timers.drain_due(self.clock) {
            let TimerOwner::Player(generation) = timer.owner;
            let TimerAction::RevertDamageBoost { multiplier } = timer.action;
            match self.player.as_mut() {
                Some(player) if player.generation == generation => {
                    player.damage_multiplier /= multiplier;
                    out_events.push(Event::DamageBoostExpired { multiplier });
                }
                _ => debug!(generation, "damage boost owner is gone, nothing to revert"),
            }
        }
    }

    fn regenerate(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let now = self.clock;
        if let Some(player) = self.player.as_mut() {
            if let Some(amount) = player.health.regenerate(dt, now) {
                out_events.push(Event::PlayerHealed { amount });
                out_events.push(Event::HealthChanged {
                    current: player.health.current(),
                    max: player.health.max(),
                });
            }
        }

        for enemy in self.enemies.values_mut() {
            if let Some(amount) = enemy.health.regenerate(dt, now) {
                out_events.push(Event::EnemyHealed {
                    enemy: enemy.id,
                    amount,
                });
            }
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(target) = self
            .player
            .as_ref()
            .filter(|player| player.is_alive())
            .map(|player| player.position)
        else {
            return;
        };

        let now = self.clock;
        let mut hits = Vec::new();
        for enemy in self.enemies.values_mut() {
            enemy.chase(target, dt);
            if let Some(damage) = enemy.try_contact(target, now) {
                hits.push(damage);
            }
        }

        for damage in hits {
            if self.damage_player(damage, out_events) {
                break;
            }
        }
    }

    /// Applies damage to the player, returning whether it died.
    fn damage_player(&mut self, amount: f32, out_events: &mut Vec<Event>) -> bool {
        let now = self.clock;
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        let Some(damage) = player.health.take_damage(amount, now) else {
            return false;
        };

        out_events.push(Event::PlayerDamaged {
            amount: damage.applied,
        });
        out_events.push(Event::HealthChanged {
            current: player.health.current(),
            max: player.health.max(),
        });
        if damage.died {
            self.player_died(out_events);
        }
        damage.died
    }

    fn player_died(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::PlayerDied);
        if let Some(player) = self.player.as_ref() {
            let _ = self.timers.cancel_owner(TimerOwner::Player(player.generation));
        }
        self.force_game_over(out_events);
    }

    fn force_game_over(&mut self, out_events: &mut Vec<Event>) {
        match self.run.game_over() {
            Ok(from) => {
                info!(?from, score = self.run.score(), "run lost");
                out_events.push(Event::PhaseChanged {
                    from,
                    to: RunPhase::GameOver,
                });
                self.abort_wave(from.is_combat(), out_events);
            }
            Err(error) => debug!(%error, "game over ignored"),
        }
    }

    /// Sends every enemy back to its pool and stops the wave if one is in
    /// flight.
    fn abort_wave(&mut self, in_flight: bool, out_events: &mut Vec<Event>) {
        let enemies = std::mem::take(&mut self.enemies);
        for (id, enemy) in enemies {
            let _ = self.tracker.enemy_returned(id);
            let _ = self.enemy_pool.release(enemy);
            out_events.push(Event::EnemyReturned { enemy: id });
        }

        let wave = match self.tracker.abort() {
            Some(wave) => Some(wave),
            None if in_flight => Some(self.run.wave()),
            None => None,
        };
        if let Some(wave) = wave {
            info!(wave, "wave aborted");
            out_events.push(Event::WaveAborted { wave });
        }
    }

    fn attract_chips(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(target) = self
            .player
            .as_ref()
            .filter(|player| player.is_alive())
            .map(|player| player.position)
        else {
            return;
        };

        let arena = &self.config.arena;
        let step = arena.magnet_speed * dt.as_secs_f32();
        let mut collected = Vec::new();
        for chip in self.chips.values_mut() {
            let distance = chip.position.distance(target);
            if distance > arena.pickup_radius && distance <= arena.magnet_range {
                let direction = (target - chip.position).normalize_or_zero();
                chip.position += direction * step.min(distance);
            }
            if chip.position.distance(target) <= arena.pickup_radius {
                collected.push(chip.id);
            }
        }

        for id in collected {
            self.collect_chip(id, out_events);
        }
    }

    fn collect_chip(&mut self, id: ChipId, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let Some(chip) = self.chips.remove(&id) else {
            return;
        };

        let card = chip.card;
        let discarded = player.hand.add(chip);
        let size = player.hand.len();
        let discarded = discarded.map(|evicted| {
            let card = evicted.card;
            let _ = self.chip_pool.release(evicted);
            card
        });

        out_events.push(Event::ChipCollected {
            chip: id,
            card,
            discarded,
        });
        out_events.push(Event::HandChanged { size });
    }

    fn reconcile_population(&mut self, out_events: &mut Vec<Event>) {
        let enemies = &self.enemies;
        let resync = self.tracker.reconcile(|id| {
            enemies
                .get(&id)
                .is_some_and(|enemy| !enemy.health.is_dead())
        });
        if let Some(resync) = resync {
            debug!(
                tracked = resync.tracked,
                actual = resync.actual,
                "live enemy count resynchronised"
            );
        }
        if let Some(wave) = self.tracker.poll_completion() {
            self.finish_wave(wave, out_events);
        }
    }

    fn start_run(&mut self, out_events: &mut Vec<Event>) {
        self.abort_wave(self.run.phase().is_combat(), out_events);

        let chips = std::mem::take(&mut self.chips);
        for (_, chip) in chips {
            let _ = self.chip_pool.release(chip);
        }
        if let Some(mut player) = self.player.take() {
            let _ = self.timers.cancel_owner(TimerOwner::Player(player.generation));
            for chip in player.hand.clear() {
                let _ = self.chip_pool.release(chip);
            }
        }

        self.player_generation = self.player_generation.wrapping_add(1);
        let player = Player::new(
            self.player_generation,
            self.config.arena.player_start,
            &self.config.player,
        );
        out_events.push(Event::RunStarted);
        out_events.push(Event::HealthChanged {
            current: player.health.current(),
            max: player.health.max(),
        });
        out_events.push(Event::HandChanged { size: 0 });
        self.player = Some(player);

        let launch = self.run.start_new_run();
        out_events.push(Event::ScoreChanged { score: 0 });
        self.launch_wave(launch, out_events);
    }

    fn advance_wave(&mut self, out_events: &mut Vec<Event>) {
        match self.run.advance_to_next_wave() {
            Ok(launch) => self.launch_wave(launch, out_events),
            Err(error) => {
                debug!(%error, "wave advance rejected");
                out_events.push(Event::WaveAdvanceRejected {
                    phase: self.run.phase(),
                });
            }
        }
    }

    fn launch_wave(&mut self, launch: WaveLaunch, out_events: &mut Vec<Event>) {
        info!(wave = launch.wave, phase = ?launch.to, "wave scheduled");
        out_events.push(Event::WaveChanged { wave: launch.wave });
        out_events.push(Event::PhaseChanged {
            from: launch.from,
            to: launch.to,
        });
        out_events.push(Event::WaveScheduled {
            wave: launch.wave,
            config: launch.config,
        });
    }

    fn begin_wave(&mut self, expected_enemies: u32, out_events: &mut Vec<Event>) {
        if !self.run.phase().is_combat() {
            debug!(phase = ?self.run.phase(), "wave start ignored outside combat");
            return;
        }
        let wave = self.run.wave();
        self.tracker.start_wave(wave, expected_enemies);
        out_events.push(Event::WaveStarted { wave });
    }

    fn preload_enemies(&mut self, template: TemplateId, count: u32) {
        match self.enemy_pool.preload(template, count) {
            Ok(constructed) => debug!(?template, constructed, "enemy pool preloaded"),
            Err(error) => warn!(%error, "enemy preload skipped"),
        }
    }

    fn spawn_enemy(&mut self, template: TemplateId, position: Vec2, out_events: &mut Vec<Event>) {
        if !self.tracker.is_active() {
            debug!(?template, "spawn ignored without an active wave");
            out_events.push(Event::EnemySpawnRejected {
                template,
                reason: SpawnRejection::NoActiveWave,
            });
            return;
        }

        let mut enemy = match self.enemy_pool.acquire(template) {
            Ok(enemy) => enemy,
            Err(error) => {
                warn!(%error, "enemy spawn failed");
                out_events.push(Event::EnemySpawnRejected {
                    template,
                    reason: SpawnRejection::UnknownTemplate,
                });
                return;
            }
        };

        enemy.enter(position, self.clock);
        let id = enemy.id;
        if let Err(error) = self.tracker.enemy_spawned(id, &enemy.health) {
            debug!(%error, "enemy registration refused");
            let _ = self.enemy_pool.release(enemy);
            out_events.push(Event::EnemySpawnRejected {
                template,
                reason: SpawnRejection::NotTracked,
            });
            return;
        }

        let _ = self.enemies.insert(id, enemy);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            template,
            position,
        });
    }

    fn complete_wave(&mut self, out_events: &mut Vec<Event>) {
        match self.tracker.finish_drained() {
            Some(wave) => self.finish_wave(wave, out_events),
            None => debug!(
                active = self.tracker.is_active(),
                live = self.tracker.live(),
                "wave completion request ignored"
            ),
        }
    }

    fn finish_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        out_events.push(Event::WaveCompleted { wave });
        match self.run.end_wave() {
            Some((from, to)) => {
                info!(wave, ?to, score = self.run.score(), "wave cleared");
                out_events.push(Event::PhaseChanged { from, to });
            }
            None => debug!(wave, phase = ?self.run.phase(), "stale wave completion"),
        }
    }

    fn move_player(&mut self, position: Vec2) {
        match self.player.as_mut() {
            Some(player) => player.position = position,
            None => debug!("player movement ignored without a player"),
        }
    }

    fn damage_enemy(&mut self, id: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let Some(enemy) = self.enemies.get_mut(&id) else {
            debug!(?id, "damage to an absent enemy ignored");
            return;
        };
        let Some(damage) = enemy.health.take_damage(amount, now) else {
            return;
        };

        out_events.push(Event::EnemyDamaged {
            enemy: id,
            amount: damage.applied,
        });
        if damage.died {
            self.enemy_died(id, out_events);
        }
    }

    /// Runs the enemy death policy. Each step runs even if an earlier one
    /// could not.
    fn enemy_died(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(&id) else {
            return;
        };
        out_events.push(Event::EnemyDied {
            enemy: id,
            template: enemy.template,
            position: enemy.position,
        });

        match self.run.add_score(enemy.score_reward) {
            Ok(score) => out_events.push(Event::ScoreChanged { score }),
            Err(error) => warn!(%error, ?id, "score not credited"),
        }

        match self.tracker.enemy_died(id) {
            DeathNotice::WaveCompleted { wave } => self.finish_wave(wave, out_events),
            DeathNotice::Counted { .. } => {}
            DeathNotice::Stale => warn!(?id, "dead enemy was not tracked by the wave"),
        }

        if self.rng.gen::<f32>() < enemy.drop_chance {
            let card = self.random_card();
            let position = enemy.position + self.config.arena.chip_drop_offset;
            self.spawn_chip(position, card, out_events);
        }

        if self.enemy_pool.release(enemy) == Release::Pooled {
            out_events.push(Event::EnemyReturned { enemy: id });
        }
    }

    fn random_card(&mut self) -> Card {
        let rank = Rank::ALL[self.rng.gen_range(0..Rank::ALL.len())];
        let suit = Suit::ALL[self.rng.gen_range(0..Suit::ALL.len())];
        Card::new(rank, suit)
    }

    fn spawn_chip(&mut self, position: Vec2, card: Card, out_events: &mut Vec<Event>) {
        let mut chip = match self.chip_pool.acquire(()) {
            Ok(chip) => chip,
            Err(error) => {
                warn!(%error, "chip drop skipped");
                return;
            }
        };
        chip.card = card;
        chip.position = position;
        let id = chip.id;
        let _ = self.chips.insert(id, chip);
        out_events.push(Event::ChipDropped {
            chip: id,
            card,
            position,
        });
    }

    fn drop_chip(&mut self, position: Vec2, card: Option<Card>, out_events: &mut Vec<Event>) {
        let card = match card {
            Some(card) => card,
            None => self.random_card(),
        };
        self.spawn_chip(position, card, out_events);
    }

    fn activate_hand(&mut self, out_events: &mut Vec<Event>) {
        match self.take_hand() {
            Ok(cards) => {
                out_events.push(Event::HandChanged { size: 0 });
                out_events.push(Event::HandActivated { cards });
            }
            Err(reason) => {
                debug!(%reason, "hand activation rejected");
                out_events.push(Event::ActivationRejected { reason });
            }
        }
    }

    fn take_hand(&mut self) -> Result<Vec<Card>, ActivationError> {
        let player = self
            .player
            .as_mut()
            .filter(|player| player.is_alive())
            .ok_or(ActivationError::NoPlayer)?;

        let required = self.config.combo.min_activation_chips as usize;
        let held = player.hand.len();
        if held < required {
            return Err(ActivationError::NotEnoughChips { held, required });
        }
        if self.clock < player.activation_ready_at {
            return Err(ActivationError::CoolingDown {
                remaining: player.activation_ready_at - self.clock,
            });
        }

        let chips = player.hand.clear();
        let cards = chips.iter().map(|chip| chip.card).collect();
        for chip in chips {
            let _ = self.chip_pool.release(chip);
        }
        Ok(cards)
    }

    fn apply_combo(
        &mut self,
        result: HandResult,
        effect: Option<ComboEffect>,
        out_events: &mut Vec<Event>,
    ) {
        out_events.push(Event::ComboActivated {
            hand_type: result.hand_type,
            multiplier: result.multiplier,
            label: result.label,
        });

        let now = self.clock;
        let cooldown = self.config.combo.cooldown_after(result.multiplier);
        let Some(player) = self.player.as_mut() else {
            warn!(hand = %result, "combo skipped without a player");
            return;
        };
        player.activation_ready_at = now + cooldown;
        let origin = player.position;

        match effect {
            None => {}
            Some(ComboEffect::DamageBoost {
                multiplier,
                duration,
            }) => {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    warn!(multiplier, "damage boost with an unusable factor skipped");
                    return;
                }
                player.damage_multiplier *= multiplier;
                self.timers.schedule(
                    TimerOwner::Player(player.generation),
                    now + duration,
                    TimerAction::RevertDamageBoost { multiplier },
                );
                out_events.push(Event::DamageBoostApplied {
                    multiplier,
                    duration,
                });
            }
            Some(ComboEffect::Heal { amount }) => {
                if let Some(amount) = player.health.heal(amount) {
                    out_events.push(Event::PlayerHealed { amount });
                    out_events.push(Event::HealthChanged {
                        current: player.health.current(),
                        max: player.health.max(),
                    });
                }
            }
            Some(ComboEffect::AreaDamage { radius, damage }) => {
                let targets: Vec<EnemyId> = self
                    .enemies
                    .values()
                    .filter(|enemy| enemy.position.distance(origin) <= radius)
                    .map(|enemy| enemy.id)
                    .collect();
                for id in targets {
                    self.damage_enemy(id, damage, out_events);
                }
            }
            Some(ComboEffect::ArenaWipe { damage }) => {
                let targets: Vec<EnemyId> = self
                    .enemies
                    .values()
                    .filter(|enemy| !enemy.is_boss)
                    .map(|enemy| enemy.id)
                    .collect();
                for id in targets {
                    self.damage_enemy(id, damage, out_events);
                }
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::StartRun => world.start_run(out_events),
        Command::AdvanceWave => world.advance_wave(out_events),
        Command::GameOver => world.force_game_over(out_events),
        Command::BeginWave { expected_enemies } => world.begin_wave(expected_enemies, out_events),
        Command::PreloadEnemies { template, count } => world.preload_enemies(template, count),
        Command::SpawnEnemy { template, position } => {
            world.spawn_enemy(template, position, out_events)
        }
        Command::CompleteWave => world.complete_wave(out_events),
        Command::MovePlayer { position } => world.move_player(position),
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
        Command::DropChip { position, card } => world.drop_chip(position, card, out_events),
        Command::ActivateHand => world.activate_hand(out_events),
        Command::ApplyCombo { result, effect } => world.apply_combo(result, effect, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use pokershot_core::{
        Card, EnemyView, GameConfig, PlayerSnapshot, RunPhase, TemplateId, Vec2,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Simulation time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// Current run phase.
    #[must_use]
    pub fn phase(world: &World) -> RunPhase {
        world.run.phase()
    }

    /// Current wave number, zero before the first run.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.run.wave()
    }

    /// Current run score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.run.score()
    }

    /// Live enemies counted by the wave tracker.
    #[must_use]
    pub fn live_enemies(world: &World) -> u32 {
        world.tracker.live()
    }

    /// Whether the wave tracker is waiting for enemies to die.
    #[must_use]
    pub fn wave_active(world: &World) -> bool {
        world.tracker.is_active()
    }

    /// Positions at which enemies may enter the arena.
    #[must_use]
    pub fn spawn_points(world: &World) -> &[Vec2] {
        &world.config.arena.spawn_points
    }

    /// Identifiers of every configured enemy template.
    #[must_use]
    pub fn template_ids(world: &World) -> Vec<TemplateId> {
        world.config.template_ids()
    }

    /// Captures a read-only view of the enemies in the arena.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures the player's state, if a player exists.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        world
            .player
            .as_ref()
            .map(|player| player.snapshot(world.clock))
    }

    /// Cards held by the player from oldest to newest.
    #[must_use]
    pub fn hand(world: &World) -> Vec<Card> {
        world
            .player
            .as_ref()
            .map(|player| player.hand.iter().map(|chip| chip.card).collect())
            .unwrap_or_default()
    }

    /// Chips lying in the arena as card and position pairs ordered by id.
    #[must_use]
    pub fn arena_chips(world: &World) -> Vec<(Card, Vec2)> {
        world
            .chips
            .values()
            .map(|chip| (chip.card, chip.position))
            .collect()
    }

    /// Idle enemies pooled for the template.
    #[must_use]
    pub fn pooled_enemies(world: &World, template: TemplateId) -> usize {
        world.enemy_pool.available(template)
    }

    /// Idle chips in the chip pool.
    #[must_use]
    pub fn pooled_chips(world: &World) -> usize {
        world.chip_pool.available(())
    }

    /// Enemy instances built on demand because a preload was too small.
    #[must_use]
    pub fn enemy_pool_growth(world: &World) -> u32 {
        world.enemy_pool.grown()
    }

    /// Deferred actions waiting to fire.
    #[must_use]
    pub fn pending_timers(world: &World) -> usize {
        world.timers.len()
    }
}
