use spatial_ngin::{config::EngineConfig, hand::Chirality};

#[test]
fn defaults_are_valid() {
    let config = EngineConfig::default();
    config.validate().unwrap();
    assert_eq!(config.interaction.target_count, 3);
    assert_eq!(config.interaction.on_target_validity().as_millis(), 100);
    assert_eq!(config.gesture.debounce().as_millis(), 125);
    assert_eq!(config.gesture.cooldown().as_millis(), 250);
    assert_eq!(config.breathing.leaf_count, 60);
    assert_eq!(config.tile_floor.grid_size, 16);
    assert_eq!(config.tile_floor.tile_size, 1.0);
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = EngineConfig::from_toml_str(
        r#"
        seed = 42

        [interaction]
        target_count = 5
        chirality = "left"

        [gesture]
        cooldown_secs = 0.5
        "#,
    )
    .unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.interaction.target_count, 5);
    assert_eq!(config.interaction.chirality, Chirality::Left);
    assert_eq!(config.interaction.target_radius, 0.25);
    assert_eq!(config.gesture.cooldown().as_millis(), 500);
    assert_eq!(config.gesture.ready_threshold, 0.95);
    assert_eq!(config.portal, EngineConfig::default().portal);
}

#[test]
fn invalid_values_are_rejected() {
    let err = EngineConfig::from_toml_str("[gesture]\nready_threshold = 1.5\n").unwrap_err();
    assert!(format!("{err:#}").contains("gesture.ready_threshold"));

    assert!(EngineConfig::from_toml_str("[interaction]\ntarget_radius = 0.0\n").is_err());
    assert!(EngineConfig::from_toml_str("tick_duration_millis = 0\n").is_err());
    assert!(
        EngineConfig::from_toml_str("[interaction.play_volume]\nmin = [2.0, 0.0, 0.0]\n").is_err()
    );
    assert!(EngineConfig::from_toml_str("[breathing]\nbounds = [1.0, -1.0, 1.0]\n").is_err());
    assert!(EngineConfig::from_toml_str("seed = \"not a number\"\n").is_err());
    assert!(EngineConfig::from_toml_str("[tile_floor]\ngrid_size = 0\n").is_err());
    let err = EngineConfig::from_toml_str("[tile_floor]\ntile_size = -1.0\n").unwrap_err();
    assert!(format!("{err:#}").contains("tile_floor.tile_size"));
}

#[test]
fn save_and_load_round_trip() {
    let dir = std::env::temp_dir().join(format!("spatial-ngin-config-{}", std::process::id()));
    let path = dir.join("engine.toml");
    let mut config = EngineConfig::default();
    config.seed = Some(9);
    config.breathing.shuffle = false;
    config.portal.grow_secs = 3.0;

    config.save_to_path(&path).unwrap();
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    std::fs::remove_dir_all(&dir).unwrap();
    assert!(EngineConfig::load(&path).is_err());
}
