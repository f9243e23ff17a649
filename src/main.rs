use anyhow::Result;
use clap::Parser;
use xcomfortd::{config::Config, daemon, gateway, logging};

fn main() -> Result<()> {
    let config = Config::parse();

    if config.daemon {
        daemon::daemonize()?;
    }

    let log = logging::init(config.verbose, config.daemon);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(gateway::run(config, log))
}
