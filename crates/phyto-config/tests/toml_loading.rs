//! Integration tests for TOML and environment configuration loading.
//!
//! Uses figment::Jail for sandboxed file and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use phyto_config::{ConfigError, PhytoConfig};

fn layered(file: &str) -> Figment {
    Figment::from(Serialized::defaults(PhytoConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("PHYTO_").split("__"))
}

#[test]
fn loads_diagnosis_thresholds_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[diagnosis]
kb_acceptance_threshold = 0.7
cache_acceptance_threshold = 0.4
trigram_threshold = 0.25
candidate_limit = 5
cache_text_weight = 0.5
cache_ttl_hours = 48
fuzzy_max_distance = 0
"#,
        )?;

        let config = PhytoConfig::from_figment(&layered("config.toml")).map_err(|e| e.to_string())?;

        assert!((config.diagnosis.kb_acceptance_threshold - 0.7).abs() < f64::EPSILON);
        assert!((config.diagnosis.cache_acceptance_threshold - 0.4).abs() < f64::EPSILON);
        assert!((config.diagnosis.trigram_threshold - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.diagnosis.candidate_limit, 5);
        assert_eq!(config.diagnosis.cache_ttl_hours, 48);
        assert_eq!(config.diagnosis.fuzzy_max_distance, 0);
        // untouched fields keep their defaults
        assert_eq!(config.diagnosis.fuzzy_min_term_len, 5);
        Ok(())
    });
}

#[test]
fn loads_vision_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[vision]
provider = "openrouter"
base_url = "https://openrouter.ai/api/v1"
api_key = "sk-toml"
model = "google/gemini-2.0-flash"
timeout_secs = 15
language = "en"
"#,
        )?;

        let config = PhytoConfig::from_figment(&layered("config.toml")).map_err(|e| e.to_string())?;

        assert_eq!(config.vision.provider, "openrouter");
        assert_eq!(config.vision.api_key, "sk-toml");
        assert_eq!(config.vision.model, "google/gemini-2.0-flash");
        assert_eq!(config.vision.timeout_secs, 15);
        assert_eq!(config.vision.language, "en");
        assert!(config.vision.is_configured());
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "from-toml.db"

[sweeper]
interval_secs = 600
"#,
        )?;
        jail.set_env("PHYTO_DATABASE__PATH", "from-env.db");
        jail.set_env("PHYTO_VISION__API_KEY", "sk-env");

        let config = PhytoConfig::from_figment(&layered("config.toml")).map_err(|e| e.to_string())?;

        assert_eq!(config.database.path, "from-env.db");
        assert_eq!(config.vision.api_key, "sk-env");
        assert_eq!(config.sweeper.interval_secs, 600);
        Ok(())
    });
}

#[test]
fn out_of_range_threshold_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[diagnosis]
cache_acceptance_threshold = 1.5
"#,
        )?;

        let result = PhytoConfig::from_figment(&layered("config.toml"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "diagnosis.cache_acceptance_threshold"
        ));
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".phyto")?;
        jail.create_file(
            ".phyto/config.toml",
            r#"
[diagnosis]
candidate_limit = 7
"#,
        )?;

        let config = PhytoConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.diagnosis.candidate_limit, 7);
        Ok(())
    });
}
