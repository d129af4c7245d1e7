pub mod config;
pub mod logging;
pub mod paths;
pub mod redact;
pub mod report;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, MpdConfig, Password, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use report::{Plugin, PluginError, ReportSink};

pub const APP_NAME: &str = "mpdstat";
pub const APP_AUTHOR: &str = "Mpdstat";
pub const APP_QUALIFIER: &str = "io";
