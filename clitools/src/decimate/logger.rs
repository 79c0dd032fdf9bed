use tracing_subscriber::filter::LevelFilter;

/// Map the `-v` count to a level filter
pub fn level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install a stderr subscriber; `log` records from the library are bridged into it
///
/// Samples go to stdout, so nothing is logged there.
pub fn init(verbosity: u8) {
    // a subscriber may already be installed when called twice
    let _ = tracing_subscriber::fmt()
        .with_max_level(level(verbosity))
        .with_writer(std::io::stderr)
        .try_init();
}
