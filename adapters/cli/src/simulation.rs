//! Headless driver that pumps the world and its systems until a run ends.

use std::{collections::BTreeMap, fmt, time::Duration};

use anyhow::{Context, Result};
use pokershot_core::{Command, Event, GameConfig, HandType, RunPhase, Vec2, HAND_SIZE};
use pokershot_system_combat::AutoShooter;
use pokershot_system_combo::Combo;
use pokershot_system_spawning::{Config as SpawnerConfig, WaveSpawner};
use pokershot_world::{self as world, query, World};
use tracing::info;

/// Radius of the circle the simulated player walks around the arena centre.
const ORBIT_RADIUS: f32 = 5.0;
/// Angular speed of the simulated player, in radians per second.
const ORBIT_SPEED: f32 = 0.6;

/// Knobs that steer the headless player.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Options {
    /// Simulated time advanced per tick.
    pub(crate) tick: Duration,
    /// Simulated time after which the run is cut short.
    pub(crate) duration: Duration,
    /// Activates the hand as soon as it is full and off cooldown.
    pub(crate) auto_activate: bool,
    /// Launches the next wave as soon as the shop opens.
    pub(crate) auto_advance: bool,
}

/// World plus the systems that react to its events.
pub(crate) struct Simulation {
    world: World,
    spawner: WaveSpawner,
    combo: Combo,
    shooter: AutoShooter,
    options: Options,
    tally: Tally,
}

#[derive(Debug, Default)]
struct Tally {
    kills: u32,
    chips_collected: u32,
    waves_cleared: u32,
    combos: BTreeMap<HandType, u32>,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyDied { .. } => self.kills += 1,
                Event::ChipCollected { .. } => self.chips_collected += 1,
                Event::WaveCompleted { .. } => self.waves_cleared += 1,
                Event::ComboActivated { hand_type, .. } => {
                    *self.combos.entry(*hand_type).or_insert(0) += 1;
                }
                _ => {}
            }
        }
    }
}

/// Outcome of a simulated run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    elapsed: Duration,
    phase: RunPhase,
    wave: u32,
    score: u32,
    kills: u32,
    chips_collected: u32,
    waves_cleared: u32,
    combos: BTreeMap<HandType, u32>,
    health: Option<(f32, f32)>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run ended in {:?} after {:.1}s",
            self.phase,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(f, "  wave {}, score {}", self.wave, self.score)?;
        writeln!(
            f,
            "  waves cleared: {}, enemies killed: {}, chips collected: {}",
            self.waves_cleared, self.kills, self.chips_collected
        )?;
        if self.combos.is_empty() {
            writeln!(f, "  combos: none")?;
        } else {
            let combos: Vec<String> = self
                .combos
                .iter()
                .rev()
                .map(|(hand_type, count)| format!("{} x{count}", hand_type.label()))
                .collect();
            writeln!(f, "  combos: {}", combos.join(", "))?;
        }
        match self.health {
            Some((current, max)) => write!(f, "  player health: {current:.0}/{max:.0}"),
            None => write!(f, "  player health: -"),
        }
    }
}

impl Simulation {
    /// Builds the world and the systems for the configuration.
    pub(crate) fn new(config: GameConfig, options: Options) -> Result<Self> {
        let spawner = WaveSpawner::new(SpawnerConfig::new(config.seed));
        let combo = Combo::new(config.combo.clone());
        let shooter = AutoShooter::new(config.weapon.clone());
        let world = World::new(config).context("failed to build the world")?;
        Ok(Self {
            world,
            spawner,
            combo,
            shooter,
            options,
            tally: Tally::default(),
        })
    }

    /// Greeting shown before the run starts.
    pub(crate) fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Plays a fresh run until it ends or the time budget is spent.
    pub(crate) fn run(&mut self) -> Summary {
        self.submit(Command::StartRun);

        let mut elapsed = Duration::ZERO;
        while elapsed < self.options.duration && !query::phase(&self.world).is_terminal() {
            elapsed += self.options.tick;
            self.submit(Command::MovePlayer {
                position: orbit(elapsed),
            });
            self.submit(Command::Tick {
                dt: self.options.tick,
            });

            if self.options.auto_activate && self.hand_ready() {
                self.submit(Command::ActivateHand);
            }
            if self.options.auto_advance && query::phase(&self.world) == RunPhase::Shopping {
                self.submit(Command::AdvanceWave);
            }
        }

        let summary = self.summary();
        info!(
            phase = ?summary.phase,
            wave = summary.wave,
            score = summary.score,
            "simulation finished"
        );
        summary
    }

    fn hand_ready(&self) -> bool {
        query::player(&self.world).is_some_and(|player| {
            !player.is_dead
                && player.hand_size >= HAND_SIZE
                && player.activation_ready_in.is_zero()
        })
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        let mut commands = Vec::new();
        while !events.is_empty() {
            self.tally.record(&events);

            let templates = query::template_ids(&self.world);
            self.spawner.handle(
                &events,
                query::spawn_points(&self.world),
                &templates,
                query::live_enemies(&self.world),
                &mut commands,
            );
            self.combo.handle(&events, &mut commands);
            self.shooter.handle(
                &events,
                query::phase(&self.world),
                query::player(&self.world).as_ref(),
                &query::enemy_view(&self.world),
                &mut commands,
            );

            events.clear();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn summary(&self) -> Summary {
        Summary {
            elapsed: query::elapsed(&self.world),
            phase: query::phase(&self.world),
            wave: query::wave(&self.world),
            score: query::score(&self.world),
            kills: self.tally.kills,
            chips_collected: self.tally.chips_collected,
            waves_cleared: self.tally.waves_cleared,
            combos: self.tally.combos.clone(),
            health: query::player(&self.world).map(|player| (player.health, player.max_health)),
        }
    }
}

fn orbit(elapsed: Duration) -> Vec2 {
    let angle = elapsed.as_secs_f32() * ORBIT_SPEED;
    Vec2::new(angle.cos(), angle.sin()) * ORBIT_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seconds: u64) -> Options {
        Options {
            tick: Duration::from_millis(50),
            duration: Duration::from_secs(seconds),
            auto_activate: true,
            auto_advance: true,
        }
    }

    fn run(config: GameConfig, options: Options) -> Summary {
        Simulation::new(config, options)
            .expect("valid config")
            .run()
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let first = run(GameConfig::default(), options(60));
        let second = run(GameConfig::default(), options(60));
        assert_eq!(first, second);
    }

    #[test]
    fn first_wave_is_cleared_and_scored() {
        let summary = run(GameConfig::default(), options(60));
        assert!(summary.waves_cleared >= 1, "{summary}");
        assert!(summary.kills >= 5, "{summary}");
        assert!(summary.score >= 250, "{summary}");
    }

    #[test]
    fn without_auto_advance_the_run_waits_in_the_shop() {
        let summary = run(
            GameConfig::default(),
            Options {
                auto_advance: false,
                ..options(60)
            },
        );
        assert_eq!(summary.phase, RunPhase::Shopping);
        assert_eq!(summary.wave, 1);
        assert_eq!(summary.waves_cleared, 1);
    }

    #[test]
    fn summary_lists_strongest_combos_first() {
        let summary = Summary {
            elapsed: Duration::from_secs(12),
            phase: RunPhase::Victory,
            wave: 4,
            score: 2_300,
            kills: 9,
            chips_collected: 9,
            waves_cleared: 4,
            combos: BTreeMap::from([(HandType::Pair, 2), (HandType::Flush, 1)]),
            health: Some((40.0, 100.0)),
        };
        let text = summary.to_string();
        assert!(text.starts_with("run ended in Victory after 12.0s"));
        assert!(text.contains("combos: Flush x1, Pair x2"));
        assert!(text.ends_with("player health: 40/100"));
    }
}
