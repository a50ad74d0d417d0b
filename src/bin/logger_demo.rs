use tollgate::logger::*;

fn main() -> anyhow::Result<()> {
    let json = std::env::args().any(|arg| arg == "--json");
    let logger = Logger::new_bootstrap(json);
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!(subject = "alice", "bootstrap info log");

    let config = LogConfig {
        filter: "debug,tollgate=trace".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    warn!(session_id = "3f1c", "refresh rejected");

    Ok(())
}
