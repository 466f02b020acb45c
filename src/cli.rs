//! Command line interface.

use clap::Parser;

/// OpenID Connect provider.
#[derive(Debug, Clone, Parser)]
#[command(name = "op-server", version, about)]
pub struct Cli {
    /// Serve HTTPS using webserver.cert and webserver.key
    #[arg(short = 't', long)]
    pub tls: bool,

    /// Skip certificate verification on outbound HTTPS requests
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Configuration file, with or without the .toml extension
    pub config: String,
}

impl Cli {
    pub fn verify_ssl(&self) -> bool {
        !self.insecure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_config() {
        let cli = Cli::try_parse_from(["op-server", "-t", "-k", "op_config"]).unwrap();
        assert!(cli.tls);
        assert!(cli.insecure);
        assert!(!cli.verify_ssl());
        assert_eq!(cli.config, "op_config");
    }

    #[test]
    fn flags_default_off() {
        let cli = Cli::try_parse_from(["op-server", "conf.toml"]).unwrap();
        assert!(!cli.tls);
        assert!(cli.verify_ssl());
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["op-server", "-t"]).is_err());
    }
}
