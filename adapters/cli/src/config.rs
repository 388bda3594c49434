//! Loading of run configuration files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use pokershot_core::GameConfig;
use tracing::info;

/// Reads the configuration at `path`, or the built-in demo run when no path
/// is given. The result has already been validated.
pub(crate) fn load(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        info!("using built-in configuration");
        return validated(GameConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config =
        parse(&text).with_context(|| format!("invalid configuration {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates TOML configuration text.
pub(crate) fn parse(text: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(text).context("failed to parse TOML")?;
    validated(config)
}

fn validated(config: GameConfig) -> Result<GameConfig> {
    config.validate().context("configuration rejected")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokershot_core::{TemplateId, Vec2};

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let config = parse("").expect("defaults are valid");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn bundled_configuration_matches_the_built_in_run() {
        let config = parse(include_str!("../../../config/pokershot.toml")).expect("valid config");
        assert_eq!(
            config,
            GameConfig {
                seed: 20231,
                ..GameConfig::default()
            }
        );
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse(
            r#"
            seed = 99

            [weapon]
            fire_rate = 2.5

            [arena]
            spawn_points = [[0.0, 12.0], [0.0, -12.0]]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 99);
        assert_eq!(config.weapon.fire_rate, 2.5);
        assert_eq!(config.weapon.damage_per_shot, 2.0);
        assert_eq!(
            config.arena.spawn_points,
            vec![Vec2::new(0.0, 12.0), Vec2::new(0.0, -12.0)]
        );
    }

    #[test]
    fn waves_reference_templates_by_id() {
        let config = parse(
            r#"
            [[enemy_templates]]
            id = 7
            name = "imp"
            max_health = 5.0

            [[waves]]
            wave_number = 1
            total_enemies = 3
            spawn_table = [{ template = 7, weight = 1.0 }]

            [boss_wave]
            wave_number = 2
            total_enemies = 1
            spawn_table = [{ template = 7, weight = 1.0, max_count = 1 }]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.template_ids(), vec![TemplateId::new(7)]);
        assert_eq!(config.waves[0].spawn_table[0].template, Some(TemplateId::new(7)));
    }

    #[test]
    fn unknown_templates_are_rejected() {
        let error = parse(
            r#"
            [[waves]]
            wave_number = 1
            spawn_table = [{ template = 42, weight = 1.0 }]
            "#,
        )
        .expect_err("template 42 does not exist");
        assert!(format!("{error:#}").contains("configuration rejected"));
    }

    #[test]
    fn missing_files_name_the_path() {
        let error = load(Some(Path::new("/nonexistent/pokershot.toml")))
            .expect_err("file does not exist");
        assert!(error.to_string().contains("/nonexistent/pokershot.toml"));
    }
}
