use clap::Parser;

/// Command line surface of the gateway.
///
/// `-h` is the broker host, so the automatic help shorthand is disabled and
/// help stays long-form only.
#[derive(Debug, Parser)]
#[command(
    name = "xcomfortd",
    about = "Eaton xComfort (CKOZ-00/14) to MQTT gateway",
    disable_help_flag = true
)]
pub struct Config {
    /// Log protocol traffic.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Fork into the background and log to syslog.
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// MQTT broker host.
    #[arg(short = 'h', long, default_value = "localhost")]
    pub host: String,

    /// MQTT broker port.
    #[arg(short = 'p', long, default_value_t = 1883)]
    pub port: u16,

    /// MQTT username.
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// MQTT password.
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Telegrams to keep in flight at once. The stick is known to drop
    /// overlapped requests, so raise this only if yours behaves.
    #[arg(long, default_value_t = 1)]
    pub parallel: u8,

    /// Print help.
    #[arg(long, action = clap::ArgAction::HelpLong)]
    help: Option<bool>,
}
