//! Run and wave progression state machine.

use pokershot_core::{RunPhase, WaveConfig};
use thiserror::Error;

/// Rejected run transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Waves only advance from the shop.
    #[error("cannot advance waves while {0:?}")]
    NotShopping(RunPhase),
    /// The run already ended.
    #[error("run already ended in {0:?}")]
    Terminal(RunPhase),
    /// Score is only credited while a run is in progress.
    #[error("no run in progress ({0:?})")]
    NoActiveRun(RunPhase),
}

/// A wave that was just selected and needs spawning.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveLaunch {
    /// Wave number, starting at one.
    pub wave: u32,
    /// Configuration to spawn.
    pub config: WaveConfig,
    /// Phase left behind.
    pub from: RunPhase,
    /// Phase entered.
    pub to: RunPhase,
}

/// Wave counter, score and phase of the current run.
#[derive(Debug)]
pub struct RunController {
    phase: RunPhase,
    wave: u32,
    score: u32,
    waves: Vec<WaveConfig>,
    boss: WaveConfig,
}

impl RunController {
    /// Creates a controller waiting in [`RunPhase::Preparing`].
    #[must_use]
    pub fn new(waves: Vec<WaveConfig>, boss: WaveConfig) -> Self {
        Self {
            phase: RunPhase::Preparing,
            wave: 0,
            score: 0,
            waves,
            boss,
        }
    }

    /// Resets counters and launches the first wave.
    pub fn start_new_run(&mut self) -> WaveLaunch {
        self.wave = 0;
        self.score = 0;
        self.launch_next()
    }

    /// Leaves the shop for the next normal wave, or the boss wave once the
    /// sequence is exhausted.
    pub fn advance_to_next_wave(&mut self) -> Result<WaveLaunch, TransitionError> {
        if self.phase != RunPhase::Shopping {
            return Err(TransitionError::NotShopping(self.phase));
        }
        Ok(self.launch_next())
    }

    fn launch_next(&mut self) -> WaveLaunch {
        self.wave = self.wave.saturating_add(1);
        let index = self.wave as usize - 1;
        let (config, to) = match self.waves.get(index) {
            Some(config) => (config.clone(), RunPhase::Playing),
            None => (self.boss.clone(), RunPhase::BossFight),
        };
        let from = self.phase;
        self.phase = to;
        WaveLaunch {
            wave: self.wave,
            config,
            from,
            to,
        }
    }

    /// Credits points, returning the new score.
    pub fn add_score(&mut self, points: u32) -> Result<u32, TransitionError> {
        if self.phase == RunPhase::Preparing || self.phase.is_terminal() {
            return Err(TransitionError::NoActiveRun(self.phase));
        }
        self.score = self.score.saturating_add(points);
        Ok(self.score)
    }

    /// Ends the current wave. Only combat phases move on; anything else is a
    /// stale signal and yields `None`.
    pub fn end_wave(&mut self) -> Option<(RunPhase, RunPhase)> {
        let to = match self.phase {
            RunPhase::Playing => RunPhase::Shopping,
            RunPhase::BossFight => RunPhase::Victory,
            _ => return None,
        };
        let from = self.phase;
        self.phase = to;
        Some((from, to))
    }

    /// Forces the lost terminal phase, returning the phase it replaced.
    pub fn game_over(&mut self) -> Result<RunPhase, TransitionError> {
        if self.phase.is_terminal() {
            return Err(TransitionError::Terminal(self.phase));
        }
        let from = self.phase;
        self.phase = RunPhase::GameOver;
        Ok(from)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Current wave number, zero before the first launch.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(number: u32) -> WaveConfig {
        WaveConfig {
            wave_number: number,
            ..WaveConfig::default()
        }
    }

    fn controller() -> RunController {
        RunController::new(vec![wave(1), wave(2)], wave(99))
    }

    #[test]
    fn new_run_launches_the_first_wave() {
        let mut run = controller();
        let launch = run.start_new_run();

        assert_eq!(launch.wave, 1);
        assert_eq!(launch.config.wave_number, 1);
        assert_eq!((launch.from, launch.to), (RunPhase::Preparing, RunPhase::Playing));
        assert_eq!(run.score(), 0);
    }

    #[test]
    fn advancing_requires_the_shop() {
        let mut run = controller();
        assert_eq!(
            run.advance_to_next_wave(),
            Err(TransitionError::NotShopping(RunPhase::Preparing))
        );

        let _ = run.start_new_run();
        assert_eq!(
            run.advance_to_next_wave(),
            Err(TransitionError::NotShopping(RunPhase::Playing))
        );
    }

    #[test]
    fn sequence_ends_with_the_boss_and_victory() {
        let mut run = controller();
        let _ = run.start_new_run();
        assert_eq!(run.end_wave(), Some((RunPhase::Playing, RunPhase::Shopping)));

        let second = run.advance_to_next_wave().expect("shopping");
        assert_eq!((second.wave, second.to), (2, RunPhase::Playing));
        assert_eq!(run.end_wave(), Some((RunPhase::Playing, RunPhase::Shopping)));

        let boss = run.advance_to_next_wave().expect("shopping");
        assert_eq!(boss.wave, 3);
        assert_eq!(boss.config.wave_number, 99);
        assert_eq!(boss.to, RunPhase::BossFight);

        assert_eq!(run.end_wave(), Some((RunPhase::BossFight, RunPhase::Victory)));
        assert_eq!(run.end_wave(), None);
        assert_eq!(run.game_over(), Err(TransitionError::Terminal(RunPhase::Victory)));
    }

    #[test]
    fn stale_wave_endings_are_ignored() {
        let mut run = controller();
        assert_eq!(run.end_wave(), None);
        let _ = run.start_new_run();
        let _ = run.end_wave();
        assert_eq!(run.end_wave(), None);
        assert_eq!(run.phase(), RunPhase::Shopping);
    }

    #[test]
    fn score_accumulates_only_during_a_run() {
        let mut run = controller();
        assert_eq!(
            run.add_score(10),
            Err(TransitionError::NoActiveRun(RunPhase::Preparing))
        );

        let _ = run.start_new_run();
        assert_eq!(run.add_score(10), Ok(10));
        assert_eq!(run.add_score(u32::MAX), Ok(u32::MAX));

        assert_eq!(run.game_over(), Ok(RunPhase::Playing));
        assert_eq!(
            run.add_score(1),
            Err(TransitionError::NoActiveRun(RunPhase::GameOver))
        );
    }

    #[test]
    fn new_run_resets_progress() {
        let mut run = controller();
        let _ = run.start_new_run();
        let _ = run.add_score(300);
        let _ = run.end_wave();
        let _ = run.advance_to_next_wave();
        assert_eq!(run.game_over(), Ok(RunPhase::Playing));

        let launch = run.start_new_run();
        assert_eq!(launch.from, RunPhase::GameOver);
        assert_eq!(launch.wave, 1);
        assert_eq!(run.score(), 0);
    }
}
