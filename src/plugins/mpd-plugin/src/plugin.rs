use crate::event::UpdateEvent;
use crate::session::SessionConfig;
use crate::supervisor::{RetryPolicy, Supervisor};
use crate::transport::Endpoint;
use crate::wakeup::FifoWakeup;
use mpdstat_core::report::PluginResult;
use mpdstat_core::{MpdConfig, Plugin, PluginError, ReportSink};

pub const PLUGIN_ID: &str = "mpd";

/// The MPD status plugin: configuration in, update events out.
pub struct MpdPlugin {
    supervisor: Supervisor<FifoWakeup>,
}

impl MpdPlugin {
    /// Build the plugin from its configuration table.
    pub fn init(config: &MpdConfig) -> PluginResult<Self> {
        config.validate().map_err(|err| PluginError::Config {
            message: err.to_string(),
        })?;

        let endpoint = Endpoint::new(config.hostname.as_deref(), config.port);
        let session = SessionConfig {
            password: config.password.clone(),
            timeout: config.timeout_duration(),
        };
        let retry = RetryPolicy::from(config.retry_interval());
        let waiter = FifoWakeup::new(config.retry_fifo.clone());

        tracing::debug!(%endpoint, ?session, ?retry, "mpd plugin initialized");
        Ok(Self {
            supervisor: Supervisor::new(endpoint, session, retry, waiter),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.supervisor.endpoint()
    }
}

impl Plugin for MpdPlugin {
    type Event = UpdateEvent;

    fn id(&self) -> &str {
        PLUGIN_ID
    }

    fn run(&mut self, sink: &mut dyn ReportSink<UpdateEvent>) -> PluginResult<()> {
        match self.supervisor.run(sink) {
            Ok(never) => match never {},
            Err(err) => Err(PluginError::Fatal {
                message: err.to_string(),
            }),
        }
    }
}
