use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mpd_plugin::{Endpoint, MpdPlugin};
use mpdstat_core::{init_logging, AppDirs, Config, MpdConfig, Plugin, ReportSink};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mpdstat", version, about = "MPD status reporter")]
struct Cli {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: MpdOverrides,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect and print one JSON event per line (default)
    Run,
    /// Print the effective connection settings
    Config,
}

/// Command-line values that take precedence over the `[mpd]` table.
#[derive(Debug, Args, Clone, Default)]
struct MpdOverrides {
    /// Host name, or absolute path of a Unix-domain socket
    #[arg(long, global = true)]
    host: Option<String>,
    /// TCP port
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Idle timeout in seconds (negative disables)
    #[arg(long, global = true, allow_negative_numbers = true)]
    timeout: Option<f64>,
    /// Seconds between reconnects (negative makes failures fatal)
    #[arg(long, global = true, allow_negative_numbers = true)]
    retry_in: Option<f64>,
    /// FIFO that interrupts the reconnect wait
    #[arg(long, global = true)]
    retry_fifo: Option<PathBuf>,
}

impl MpdOverrides {
    fn apply(&self, mpd: &mut MpdConfig) {
        if let Some(host) = &self.host {
            mpd.hostname = Some(host.clone());
        }
        if let Some(port) = self.port {
            mpd.port = port;
        }
        if let Some(timeout) = self.timeout {
            mpd.timeout = Some(timeout);
        }
        if let Some(retry_in) = self.retry_in {
            mpd.retry_in = retry_in;
        }
        if let Some(fifo) = &self.retry_fifo {
            mpd.retry_fifo = Some(fifo.clone());
        }
    }
}

/// Writes each reported event as one JSON line.
struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    fn new(out: W) -> Self {
        Self { out }
    }

    fn emit<E: Serialize>(&mut self, event: &E) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write, E: Serialize> ReportSink<E> for JsonLines<W> {
    fn report(&mut self, event: E) {
        if let Err(err) = self.emit(&event) {
            tracing::warn!(error = %err, "failed to write event");
        }
    }
}

fn describe(mpd: &MpdConfig) -> String {
    let endpoint = Endpoint::new(mpd.hostname.as_deref(), mpd.port);
    let seconds = |d: Option<std::time::Duration>| {
        d.map(|d| format!("{}s", d.as_secs_f64()))
            .unwrap_or_else(|| "disabled".to_string())
    };
    let mut lines = vec![
        format!("endpoint: {endpoint}"),
        format!(
            "password: {}",
            if mpd.password.is_some() { "[REDACTED]" } else { "(none)" }
        ),
        format!("timeout: {}", seconds(mpd.timeout_duration())),
        format!("retry_in: {}", seconds(mpd.retry_interval())),
    ];
    if let Some(fifo) = &mpd.retry_fifo {
        lines.push(format!("retry_fifo: {}", fifo.display()));
    }
    lines.join("\n")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(&dirs)?,
    };
    cli.overrides.apply(&mut config.mpd);
    config.validate()?;
    let _logging = init_logging(&config.logging, &dirs)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Config => {
            println!("{}", describe(&config.mpd));
        }
        Command::Run => {
            let mut plugin = MpdPlugin::init(&config.mpd)?;
            tracing::info!(
                plugin = plugin.id(),
                endpoint = %plugin.endpoint(),
                "starting status plugin"
            );
            let mut sink = JsonLines::new(io::stdout().lock());
            plugin.run(&mut sink)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpd_plugin::UpdateEvent;
    use mpdstat_core::Password;

    #[test]
    fn overrides_take_precedence() {
        let mut mpd = MpdConfig::default();
        let overrides = MpdOverrides {
            host: Some("/run/mpd/socket".into()),
            port: Some(6601),
            timeout: Some(5.0),
            retry_in: Some(-1.0),
            retry_fifo: None,
        };
        overrides.apply(&mut mpd);

        assert_eq!(mpd.hostname.as_deref(), Some("/run/mpd/socket"));
        assert_eq!(mpd.port, 6601);
        assert_eq!(mpd.timeout, Some(5.0));
        assert_eq!(mpd.retry_interval(), None);
    }

    #[test]
    fn empty_overrides_keep_config() {
        let mut mpd = MpdConfig::default();
        MpdOverrides::default().apply(&mut mpd);
        assert_eq!(mpd.port, 6600);
        assert_eq!(mpd.retry_in, 10.0);
    }

    #[test]
    fn describe_hides_password() {
        let mpd = MpdConfig {
            hostname: Some("music.local".into()),
            password: Some(Password::new("hunter2")),
            ..MpdConfig::default()
        };
        let text = describe(&mpd);
        assert!(text.contains("endpoint: music.local:6600"));
        assert!(text.contains("password: [REDACTED]"));
        assert!(text.contains("timeout: disabled"));
        assert!(text.contains("retry_in: 10s"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn events_are_written_as_json_lines() {
        let mut sink = JsonLines::new(Vec::new());
        sink.report(UpdateEvent::Connecting);
        sink.report(UpdateEvent::Timeout);
        assert_eq!(
            String::from_utf8(sink.out).unwrap(),
            "{\"what\":\"connecting\"}\n{\"what\":\"timeout\"}\n"
        );
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from(["mpdstat", "--host", "localhost", "--retry-in", "-1", "config"]);
        assert_eq!(cli.overrides.host.as_deref(), Some("localhost"));
        assert_eq!(cli.overrides.retry_in, Some(-1.0));
        assert!(matches!(cli.command, Some(Command::Config)));
    }
}
