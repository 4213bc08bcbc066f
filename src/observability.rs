use biometrics::{Collector, Counter, Moments};
use tracing_subscriber::{EnvFilter, fmt};

pub(crate) static RELAY_REQUESTS: Counter = Counter::new("chatrelay.relay.requests");
pub(crate) static RELAY_ERRORS: Counter = Counter::new("chatrelay.relay.errors");
pub(crate) static RELAY_REJECTED: Counter = Counter::new("chatrelay.relay.rejected");
pub(crate) static GENERATION_DURATION: Moments =
    Moments::new("chatrelay.generation.duration_seconds");

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatrelay.client.requests");
pub(crate) static CLIENT_TIMEOUTS: Counter = Counter::new("chatrelay.client.timeouts");
pub(crate) static CLIENT_FAILURES: Counter = Counter::new("chatrelay.client.failures");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatrelay.client.request_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&RELAY_REQUESTS);
    collector.register_counter(&RELAY_ERRORS);
    collector.register_counter(&RELAY_REJECTED);
    collector.register_moments(&GENERATION_DURATION);

    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_TIMEOUTS);
    collector.register_counter(&CLIENT_FAILURES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
}

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` selects the filter (default `info`); `CHATRELAY_LOG_JSON=1` switches to
/// JSON lines.  Calling this twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = fmt().with_env_filter(filter).with_target(false);
    let installed = if std::env::var("CHATRELAY_LOG_JSON").ok().as_deref() == Some("1") {
        fmt.json().try_init()
    } else {
        fmt.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
