use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "off" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    build_subscriber(verbose, env_filter).init();
}

/// Without `verbose` only the env filter decides what is logged.
fn build_subscriber(
    verbose: bool,
    env_filter: EnvFilter,
) -> impl Subscriber + Send + Sync + 'static {
    let app_filter = verbose.then(|| Targets::new().with_target("cambio", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
}
