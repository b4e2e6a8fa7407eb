use chrono::NaiveDate;
use std::env;

use crate::infrastructure::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE};

/// Signing secret used when `JWT_SECRET` is unset in debug builds.
const DEV_JWT_SECRET: &str = "secret";

/// Initial `date_of_death` shown on the author form unless overridden.
pub const DEFAULT_AUTHOR_FORM_DATE_OF_DEATH: &str = "2023-11-11";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Maintain the per-session visit counter on the catalog home page.
    pub track_visits: bool,
    pub author_form_date_of_death: Option<NaiveDate>,
    /// HS256 secret for login tokens, from `JWT_SECRET`.
    pub jwt_secret: Option<String>,
    /// Visit-counter sessions idle this long are forgotten.
    pub session_idle_secs: u64,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            profile: "default".to_string(),
            track_visits: true,
            author_form_date_of_death: NaiveDate::parse_from_str(
                DEFAULT_AUTHOR_FORM_DATE_OF_DEATH,
                "%Y-%m-%d",
            )
            .ok(),
            jwt_secret: None,
            session_idle_secs: DEFAULT_SESSION_IDLE.as_secs(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::for_profile(env::var("PROFILE").ok())
    }

    /// Reads the environment with an explicit profile, e.g. from `--profile`.
    pub fn for_profile(profile: Option<String>) -> Self {
        let defaults = Self::default();
        let profile = profile.unwrap_or_else(|| "default".to_string());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://locallibrary.db?mode=rwc".to_string()
            } else {
                format!("sqlite://locallibrary_{}.db?mode=rwc", profile)
            }
        });

        // An empty value clears the initial date entirely.
        let author_form_date_of_death = match env::var("AUTHOR_FORM_DATE_OF_DEATH") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!("Ignoring invalid AUTHOR_FORM_DATE_OF_DEATH '{}': {}", raw, e);
                    defaults.author_form_date_of_death
                }
            },
            Err(_) => defaults.author_form_date_of_death,
        };

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            profile,
            track_visits: env::var("TRACK_VISITS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            author_form_date_of_death,
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            session_idle_secs: env::var("SESSION_IDLE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_idle_secs),
            max_sessions: env::var("MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_sessions),
        }
    }

    /// Release builds refuse to sign tokens without an explicit secret.
    pub fn signing_secret(&self) -> Result<&str, String> {
        match self.jwt_secret.as_deref() {
            Some(secret) => Ok(secret),
            None if cfg!(debug_assertions) => Ok(DEV_JWT_SECRET),
            None => Err("JWT_SECRET environment variable must be set in production".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for key in [
            "PROFILE",
            "DATABASE_URL",
            "PORT",
            "TRACK_VISITS",
            "AUTHOR_FORM_DATE_OF_DEATH",
            "CORS_ALLOWED_ORIGINS",
            "JWT_SECRET",
            "SESSION_IDLE_SECS",
            "MAX_SESSIONS",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults_when_environment_is_empty() {
        clear();
        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://locallibrary.db?mode=rwc");
        assert_eq!(config.port, 8000);
        assert!(config.track_visits);
        assert_eq!(config.max_sessions, 10_000);
        assert_eq!(config.session_idle_secs, 14 * 24 * 60 * 60);
        assert_eq!(
            config.author_form_date_of_death,
            NaiveDate::from_ymd_opt(2023, 11, 11)
        );
    }

    #[test]
    #[serial]
    fn profile_and_toggles_are_read() {
        clear();
        unsafe {
            env::set_var("PROFILE", "staging");
            env::set_var("TRACK_VISITS", "false");
            env::set_var("AUTHOR_FORM_DATE_OF_DEATH", "");
        }
        let config = Config::from_env();
        assert_eq!(
            config.database_url,
            "sqlite://locallibrary_staging.db?mode=rwc"
        );
        assert!(!config.track_visits);
        assert_eq!(config.author_form_date_of_death, None);
        clear();
    }

    #[test]
    #[serial]
    fn explicit_profile_wins_over_environment() {
        clear();
        unsafe { env::set_var("PROFILE", "staging") };
        let config = Config::for_profile(Some("demo".to_string()));
        assert_eq!(config.profile, "demo");
        assert_eq!(config.database_url, "sqlite://locallibrary_demo.db?mode=rwc");
        clear();
    }

    #[test]
    #[serial]
    fn jwt_secret_is_read_from_environment() {
        clear();
        assert_eq!(Config::from_env().jwt_secret, None);

        unsafe { env::set_var("JWT_SECRET", "s3cret") };
        let config = Config::from_env();
        assert_eq!(config.signing_secret().unwrap(), "s3cret");
        clear();
    }
}
