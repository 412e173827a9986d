//! Noah Monitor core library
//!
//! Single-patient remote monitoring: reads the snapshot files written by the
//! sensor feed, flags critical vital-sign trends, forecasts each parameter and
//! reports location history, stay durations, bed occupancy and therapy.

pub mod core;
pub mod dashboard;
pub mod ehr;
pub mod error;
pub mod feed;
pub mod models;
pub mod snapshot;
pub mod telemetry;
pub mod ui;

pub use error::{MonitorError, Result};

/// Application configuration
pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Deserialize)]
    pub struct MonitorConfig {
        pub data: DataConfig,
        pub polling: PollingConfig,
        pub feed: FeedConfig,
        pub forecast: ForecastConfig,
        pub history: HistoryConfig,
        pub therapy: TherapyConfig,
        pub logging: LoggingConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DataConfig {
        pub vitals_dir: PathBuf,
        pub bed_dir: PathBuf,
        pub retention: usize,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PollingConfig {
        pub feed_refresh_secs: u64,
        pub full_reload_secs: u64,
        pub tick_millis: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct FeedConfig {
        pub interval_secs: u64,
        pub critical_cycle_secs: u64,
        pub critical_hold_secs: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ForecastConfig {
        pub horizon: usize,
        pub step_secs: i64,
        pub min_history: usize,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct HistoryConfig {
        pub capacity: usize,
        pub trend_points: usize,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct TherapyConfig {
        pub active_minutes: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct LoggingConfig {
        pub filter: String,
        pub json: bool,
    }

    impl Default for DataConfig {
        fn default() -> Self {
            Self {
                vitals_dir: PathBuf::from("data"),
                bed_dir: PathBuf::from("data/bed_availability"),
                retention: 5,
            }
        }
    }

    impl Default for PollingConfig {
        fn default() -> Self {
            Self {
                feed_refresh_secs: 60,
                full_reload_secs: 300,
                tick_millis: 1000,
            }
        }
    }

    impl Default for FeedConfig {
        fn default() -> Self {
            Self {
                interval_secs: 5,
                critical_cycle_secs: 20 * 60,
                critical_hold_secs: 30,
            }
        }
    }

    impl Default for ForecastConfig {
        fn default() -> Self {
            Self {
                horizon: 60,
                step_secs: 60,
                min_history: 10,
            }
        }
    }

    impl Default for HistoryConfig {
        fn default() -> Self {
            Self {
                capacity: 500,
                trend_points: 100,
            }
        }
    }

    impl Default for TherapyConfig {
        fn default() -> Self {
            Self { active_minutes: 60 }
        }
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                filter: "info".to_string(),
                json: false,
            }
        }
    }

    impl Default for MonitorConfig {
        fn default() -> Self {
            Self {
                data: DataConfig::default(),
                polling: PollingConfig::default(),
                feed: FeedConfig::default(),
                forecast: ForecastConfig::default(),
                history: HistoryConfig::default(),
                therapy: TherapyConfig::default(),
                logging: LoggingConfig::default(),
            }
        }
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let d = MonitorConfig::default();
        builder
            .set_default("data.vitals_dir", d.data.vitals_dir.to_string_lossy().into_owned())?
            .set_default("data.bed_dir", d.data.bed_dir.to_string_lossy().into_owned())?
            .set_default("data.retention", d.data.retention as i64)?
            .set_default("polling.feed_refresh_secs", d.polling.feed_refresh_secs as i64)?
            .set_default("polling.full_reload_secs", d.polling.full_reload_secs as i64)?
            .set_default("polling.tick_millis", d.polling.tick_millis as i64)?
            .set_default("feed.interval_secs", d.feed.interval_secs as i64)?
            .set_default("feed.critical_cycle_secs", d.feed.critical_cycle_secs as i64)?
            .set_default("feed.critical_hold_secs", d.feed.critical_hold_secs as i64)?
            .set_default("forecast.horizon", d.forecast.horizon as i64)?
            .set_default("forecast.step_secs", d.forecast.step_secs)?
            .set_default("forecast.min_history", d.forecast.min_history as i64)?
            .set_default("history.capacity", d.history.capacity as i64)?
            .set_default("history.trend_points", d.history.trend_points as i64)?
            .set_default("therapy.active_minutes", d.therapy.active_minutes)?
            .set_default("logging.filter", d.logging.filter)?
            .set_default("logging.json", d.logging.json)
    }

    /// Load configuration from file
    pub fn load_config() -> Result<MonitorConfig, config::ConfigError> {
        // Start with default settings
        let builder = defaults(config::Config::builder())?
            .add_source(config::File::with_name("config/default").required(false));

        // Override with environment-specific settings
        let env = std::env::var("NOAH_ENV").unwrap_or_else(|_| "development".into());
        let builder = builder.add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        // Override with environment variables
        builder
            .add_source(
                config::Environment::with_prefix("NOAH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

}
