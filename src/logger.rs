use log::LevelFilter;
use env_logger::Builder;
use std::io::Write;
use chrono::Local;

/// Timestamped stderr logging at Info, overridable through `RUST_LOG`.
pub fn init() {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        // Quiet the HTTP stack unless asked for explicitly.
        .filter(Some("reqwest"), LevelFilter::Warn)
        .filter(Some("html5ever"), LevelFilter::Error);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    if builder.try_init().is_ok() {
        log::debug!("Logger initialized.");
    }
}
