use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Default configuration file, optional when not named explicitly
pub const DEFAULT_CONFIG: &str = "soprano.toml";

/// OpenAI-compatible speech synthesis gateway
#[derive(Debug, Parser)]
#[command(name = "soprano", version, about = "OpenAI-compatible speech synthesis gateway")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SOPRANO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "SOPRANO_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive, `RUST_LOG` takes precedence
    #[arg(long, default_value = "info", env = "SOPRANO_LOG")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["soprano"]).unwrap();
        assert!(args.listen.is_none());
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "soprano",
            "--config",
            "/etc/soprano/soprano.toml",
            "--listen",
            "127.0.0.1:9000",
            "--log-level",
            "debug,tower_http=info",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/soprano/soprano.toml")));
        assert_eq!(args.listen, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(args.log_level, "debug,tower_http=info");
    }
}
