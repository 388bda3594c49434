#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawning system that emits enemy spawn commands on a timer.

use std::time::Duration;

use pokershot_core::{Command, ConfigError, Event, SpawnEntry, TemplateId, Vec2, WaveConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

/// Random stream used by the spawner, distinct from the world's.
pub const SPAWNER_RNG_STREAM: u64 = 1;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration drawing randomness from the seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Observable state of the spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnerState {
    /// No wave is being spawned.
    Idle,
    /// The wave is being spawned.
    Spawning {
        /// Wave number.
        wave: u32,
    },
}

#[derive(Debug)]
struct ActiveWave {
    wave: u32,
    config: WaveConfig,
    target: u32,
    spawned: u32,
    spawned_per_entry: Vec<u32>,
    accumulator: Duration,
}

/// Pure system that spawns the scheduled wave one enemy per interval.
#[derive(Debug)]
pub struct WaveSpawner {
    rng: ChaCha8Rng,
    active: Option<ActiveWave>,
}

impl WaveSpawner {
    /// Creates a new idle spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        rng.set_stream(SPAWNER_RNG_STREAM);
        Self { rng, active: None }
    }

    /// Current state of the spawner.
    #[must_use]
    pub fn state(&self) -> SpawnerState {
        match &self.active {
            Some(active) => SpawnerState::Spawning { wave: active.wave },
            None => SpawnerState::Idle,
        }
    }

    /// Enemies emitted so far for the wave in progress.
    #[must_use]
    pub fn spawned(&self) -> u32 {
        self.active.as_ref().map_or(0, |active| active.spawned)
    }

    /// Consumes events and immutable views to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        spawn_points: &[Vec2],
        templates: &[TemplateId],
        live_enemies: u32,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::WaveScheduled { wave, config } => {
                    if let Err(error) = self.start_wave(*wave, config, spawn_points, templates, out)
                    {
                        error!(wave, %error, "wave configuration rejected, wave not started");
                    }
                }
                Event::WaveAborted { wave } => {
                    if self.stop_wave() {
                        debug!(wave, "spawner stopped");
                    }
                }
                Event::PhaseChanged { to, .. } if to.is_terminal() => {
                    let _ = self.stop_wave();
                }
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }
        self.advance(accumulated, spawn_points, live_enemies, templates, out);
    }

    /// Validates the wave and starts spawning it. Nothing changes when the
    /// configuration is rejected.
    pub fn start_wave(
        &mut self,
        wave: u32,
        config: &WaveConfig,
        spawn_points: &[Vec2],
        templates: &[TemplateId],
        out: &mut Vec<Command>,
    ) -> Result<(), ConfigError> {
        config.validate(templates)?;
        if spawn_points.is_empty() {
            return Err(ConfigError::NoSpawnPoints);
        }

        let _ = self.stop_wave();
        out.push(Command::BeginWave {
            expected_enemies: config.total_enemies,
        });
        for entry in config
            .spawn_table
            .iter()
            .filter(|entry| entry.is_usable(templates))
        {
            if let Some(template) = entry.template {
                out.push(Command::PreloadEnemies {
                    template,
                    count: entry.preload_count(),
                });
            }
        }

        info!(wave, total = config.total_enemies, "spawning wave");
        self.active = Some(ActiveWave {
            wave,
            target: config.total_enemies,
            spawned: 0,
            spawned_per_entry: vec![0; config.spawn_table.len()],
            // Primed so the first enemy enters on the first tick.
            accumulator: config.spawn_interval(),
            config: config.clone(),
        });
        Ok(())
    }

    /// Halts the wave in progress without reporting completion.
    pub fn stop_wave(&mut self) -> bool {
        self.active.take().is_some()
    }

    fn advance(
        &mut self,
        accumulated: Duration,
        spawn_points: &[Vec2],
        live_enemies: u32,
        templates: &[TemplateId],
        out: &mut Vec<Command>,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if active.spawned >= active.target && live_enemies == 0 {
            info!(wave = active.wave, spawned = active.spawned, "wave fully spawned and cleared");
            out.push(Command::CompleteWave);
            self.active = None;
            return;
        }

        let interval = active.config.spawn_interval();
        if interval.is_zero() || spawn_points.is_empty() {
            return;
        }

        active.accumulator = active.accumulator.saturating_add(accumulated);
        let mut live = live_enemies;
        while active.accumulator >= interval {
            active.accumulator -= interval;
            if active.spawned >= active.target || live >= active.config.max_concurrent {
                continue;
            }

            let picked = pick_weighted(
                &active.config.spawn_table,
                templates,
                &active.spawned_per_entry,
                &mut self.rng,
            );
            let Some((index, template)) = picked.and_then(|index| {
                active.config.spawn_table[index]
                    .template
                    .map(|template| (index, template))
            }) else {
                warn!(
                    wave = active.wave,
                    spawned = active.spawned,
                    "no spawnable entry left, closing the wave early"
                );
                active.target = active.spawned;
                break;
            };

            let position = spawn_points[self.rng.gen_range(0..spawn_points.len())];
            out.push(Command::SpawnEnemy { template, position });
            active.spawned_per_entry[index] += 1;
            active.spawned += 1;
            live += 1;
        }
    }
}

/// Picks a spawn table row by cumulative weight.
///
/// Rows without a known template, and rows whose `max_count` has been reached
/// according to `spawned_per_entry`, are skipped. When no row is selected by
/// weight the first eligible row is returned instead.
pub fn pick_weighted<R: Rng + ?Sized>(
    table: &[SpawnEntry],
    templates: &[TemplateId],
    spawned_per_entry: &[u32],
    rng: &mut R,
) -> Option<usize> {
    let eligible = |index: usize, entry: &SpawnEntry| {
        let spawned = spawned_per_entry.get(index).copied().unwrap_or(0);
        entry.is_usable(templates) && (entry.max_count == 0 || spawned < entry.max_count)
    };

    let total: f32 = table
        .iter()
        .enumerate()
        .filter(|(index, entry)| eligible(*index, entry))
        .map(|(_, entry)| entry.effective_weight())
        .sum();

    if total > 0.0 && total.is_finite() {
        let roll = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (index, entry) in table.iter().enumerate() {
            let weight = entry.effective_weight();
            if weight <= 0.0 || !eligible(index, entry) {
                continue;
            }
            cumulative += weight;
            if cumulative >= roll {
                return Some(index);
            }
        }
    }

    table
        .iter()
        .enumerate()
        .position(|(index, entry)| eligible(index, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(total: u32) -> WaveConfig {
        WaveConfig {
            total_enemies: total,
            max_concurrent: 2,
            spawn_interval_secs: 1.0,
            ..WaveConfig::default()
        }
    }

    #[test]
    fn zero_interval_never_spawns() {
        let mut spawner = WaveSpawner::new(Config::new(7));
        let templates = [TemplateId::new(1)];
        let points = [Vec2::ZERO];
        let mut out = Vec::new();
        spawner
            .start_wave(1, &wave(3), &points, &templates, &mut out)
            .expect("valid wave");
        if let Some(active) = spawner.active.as_mut() {
            active.config.spawn_interval_secs = 0.0;
        }

        out.clear();
        spawner.advance(Duration::from_secs(10), &points, 0, &templates, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn starting_a_wave_replaces_the_previous_one() {
        let mut spawner = WaveSpawner::new(Config::new(7));
        let templates = [TemplateId::new(1)];
        let points = [Vec2::ZERO];
        let mut out = Vec::new();
        spawner
            .start_wave(1, &wave(3), &points, &templates, &mut out)
            .expect("valid wave");
        spawner
            .start_wave(2, &wave(3), &points, &templates, &mut out)
            .expect("valid wave");

        assert_eq!(spawner.state(), SpawnerState::Spawning { wave: 2 });
        assert_eq!(spawner.spawned(), 0);
    }

    #[test]
    fn empty_tables_have_no_pick() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(pick_weighted(&[], &[TemplateId::new(1)], &[], &mut rng), None);
    }

    #[test]
    fn overflowing_weight_totals_fall_back_to_the_first_row() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let table = [
            SpawnEntry::weighted(TemplateId::new(1), f32::MAX),
            SpawnEntry::weighted(TemplateId::new(2), f32::MAX),
        ];
        let templates = [TemplateId::new(1), TemplateId::new(2)];

        assert_eq!(pick_weighted(&table, &templates, &[0, 0], &mut rng), Some(0));
    }
}
