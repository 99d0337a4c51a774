use std::{env, net::SocketAddr};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// Runtime configuration. Every knob defaults to the demo's fixed
/// workload, so the service starts with no environment at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    user_count: usize,
    edge_probability: f64,
    test_fraction: f64,
    degree_threshold: usize,
    split_seed: u64,
    layout_seed: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から設定値を読み込み、検証する。
    ///
    /// # Errors
    /// 数値・アドレスのパースに失敗した場合、または確率・比率が
    /// 範囲外の場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("RADAR_HTTP_BIND", "0.0.0.0:9100")?;
        let user_count = parse_positive_usize("RADAR_USER_COUNT", 100)?;
        let edge_probability = parse_probability("RADAR_EDGE_PROBABILITY", 0.1)?;
        let test_fraction = parse_probability("RADAR_TEST_FRACTION", 0.2)?;
        let degree_threshold = parse_usize("RADAR_DEGREE_THRESHOLD", 5)?;
        let split_seed = parse_u64("RADAR_SPLIT_SEED", 42)?;
        let layout_seed = parse_optional_u64("RADAR_LAYOUT_SEED")?;

        Ok(Self {
            http_bind,
            user_count,
            edge_probability,
            test_fraction,
            degree_threshold,
            split_seed,
            layout_seed,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    #[must_use]
    pub fn edge_probability(&self) -> f64 {
        self.edge_probability
    }

    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    #[must_use]
    pub fn degree_threshold(&self) -> usize {
        self.degree_threshold
    }

    #[must_use]
    pub fn split_seed(&self) -> u64 {
        self.split_seed
    }

    #[must_use]
    pub fn layout_seed(&self) -> Option<u64> {
        self.layout_seed
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_positive_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let parsed = parse_usize(name, default)?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("must be greater than zero"),
        });
    }
    Ok(parsed)
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_optional_u64(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|error| ConfigError::Invalid {
                name,
                source: anyhow::Error::new(error),
            }),
    }
}

fn parse_probability(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 0.0 and 1.0"),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests run under ENV_MUTEX and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn remove_env(name: &str) {
        // SAFETY: tests run under ENV_MUTEX and clean up deterministic keys.
        unsafe {
            env::remove_var(name);
        }
    }

    fn clear_radar_env() {
        for name in [
            "RADAR_HTTP_BIND",
            "RADAR_USER_COUNT",
            "RADAR_EDGE_PROBABILITY",
            "RADAR_TEST_FRACTION",
            "RADAR_DEGREE_THRESHOLD",
            "RADAR_SPLIT_SEED",
            "RADAR_LAYOUT_SEED",
        ] {
            remove_env(name);
        }
    }

    #[test]
    fn defaults_match_the_demo_workload() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        clear_radar_env();
        let config = Config::from_env().expect("config loads");
        assert_eq!(config.user_count(), 100);
        assert!((config.edge_probability() - 0.1).abs() < f64::EPSILON);
        assert!((config.test_fraction() - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.degree_threshold(), 5);
        assert_eq!(config.split_seed(), 42);
        assert_eq!(config.layout_seed(), None);
        assert_eq!(config.http_bind().port(), 9100);
    }

    #[test]
    fn environment_overrides_are_honored() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        clear_radar_env();
        set_env("RADAR_USER_COUNT", "250");
        set_env("RADAR_EDGE_PROBABILITY", "0.3");
        set_env("RADAR_LAYOUT_SEED", "7");
        let config = Config::from_env().expect("config loads");
        assert_eq!(config.user_count(), 250);
        assert!((config.edge_probability() - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.layout_seed(), Some(7));
        clear_radar_env();
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        clear_radar_env();
        set_env("RADAR_EDGE_PROBABILITY", "1.5");
        assert!(Config::from_env().is_err());
        clear_radar_env();
    }

    #[test]
    fn zero_user_count_is_rejected() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        clear_radar_env();
        set_env("RADAR_USER_COUNT", "0");
        assert!(Config::from_env().is_err());
        clear_radar_env();
    }
}
