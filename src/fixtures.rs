#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};
    use std::time::{Duration, SystemTime};

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct AppConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Tags attached to every request.
        #[config(default = ["web", "api"])]
        pub tags: Vec<String>,

        /// Database settings.
        #[config(nested)]
        pub database: DbConfig,

        /// Response cache.
        #[config(nested)]
        pub cache: CacheConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct DbConfig {
        /// Connection string URL.
        #[config(default = "sqlite::memory:")]
        pub url: String,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: usize,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct CacheConfig {
        #[config(default = true)]
        pub enabled: bool,

        /// Seconds before an entry expires.
        #[config(default = 60)]
        pub ttl: u32,
    }

    #[test]
    fn app_config_loads_defaults() {
        let config = AppConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.tags, vec!["web", "api"]);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.pool_size, 5);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl, 60);
    }

    // -- Boxed nesting ---------------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct BoxedConfig {
        pub value1: String,
        pub inner: Box<InnerType>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct InnerType {
        pub value2: String,
    }

    impl Default for BoxedConfig {
        fn default() -> Self {
            BoxedConfig {
                value1: "outer".into(),
                inner: Box::new(InnerType {
                    value2: "inner".into(),
                }),
            }
        }
    }

    // -- Flattened fields --------------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    pub struct FlattenedConfig {
        pub name: String,
        #[serde(flatten)]
        pub common: Common,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    pub struct Common {
        pub verbose: bool,
        pub retries: u32,
    }

    // -- Shapes the converter treats specially -----------------------------------

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct OptionalConfig {
        pub token: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename = "service")]
    pub struct RenamedConfig {
        pub level: u32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct TimedConfig {
        pub timeout: Duration,
        pub started: SystemTime,
        pub backoff: Vec<Duration>,
    }

    impl Default for TimedConfig {
        fn default() -> Self {
            TimedConfig {
                timeout: Duration::from_secs(30),
                started: SystemTime::UNIX_EPOCH,
                backoff: vec![Duration::from_millis(100), Duration::from_secs(1)],
            }
        }
    }

    // -- Unit enums ----------------------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum LogLevel {
        Error,
        Warn,
        Info,
        Debug,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct LoggingConfig {
        /// Lowest level that is written.
        #[config(default = "info")]
        pub level: LogLevel,

        /// Lines buffered before a flush.
        #[config(default = 64)]
        pub buffer: u32,

        /// Extra targets logged at `debug` regardless of `level`.
        #[config(default = ["http"])]
        pub verbose_targets: Vec<String>,
    }

    // -- Component settings --------------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename = "Config")]
    pub struct ComponentConfig {
        pub value: String,
    }
}
