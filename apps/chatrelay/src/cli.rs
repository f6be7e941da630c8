use std::path::PathBuf;

use chatrelay_common::GlobalConfigPatch;
use clap::Parser;

/// Flags left unset fall through to the config file, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "chatrelay", about = "OpenAI-compatible chat completion relay")]
pub(crate) struct Cli {
    #[arg(long, env = "CHATRELAY_HOST")]
    pub(crate) host: Option<String>,
    #[arg(long, env = "CHATRELAY_PORT")]
    pub(crate) port: Option<u16>,
    /// JSON file holding a partial `GlobalConfig`.
    #[arg(long, env = "CHATRELAY_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    /// Answer every request with its adapted prompt.
    #[arg(long)]
    pub(crate) echo: bool,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[arg(long, env = "CHATRELAY_LOG")]
    pub(crate) log: Option<String>,
}

impl Cli {
    pub(crate) fn patch(&self) -> GlobalConfigPatch {
        GlobalConfigPatch {
            host: self.host.clone(),
            port: self.port,
            echo: self.echo.then_some(true),
            redact: None,
            log_filter: self.log.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_leave_patch_empty() {
        let cli = Cli::parse_from(["chatrelay"]);
        assert_eq!(cli.patch(), GlobalConfigPatch::default());
    }

    #[test]
    fn flags_fill_patch() {
        let cli = Cli::parse_from([
            "chatrelay",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--echo",
            "--log",
            "chatrelay=debug",
        ]);
        let patch = cli.patch();
        assert_eq!(patch.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(patch.port, Some(9000));
        assert_eq!(patch.echo, Some(true));
        assert_eq!(patch.log_filter.as_deref(), Some("chatrelay=debug"));
    }
}
