//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Logs go to stderr so a JSON bundle on stdout stays parseable.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("posture_audit={default_level},warn")));

    // A subscriber may already be installed when embedded in another binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run `f` on this thread, counting the events it emits at `level`.
#[cfg(test)]
pub(crate) fn count_events<T>(level: tracing::Level, f: impl FnOnce() -> T) -> (T, usize) {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct Counter {
        level: tracing::Level,
        seen: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for Counter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == self.level {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    let seen = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(Counter {
        level,
        seen: Arc::clone(&seen),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, seen.load(Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_count_events_filters_by_level() {
        let ((), errors) = count_events(Level::ERROR, || {
            tracing::warn!("not counted");
            tracing::error!("counted");
        });
        assert_eq!(errors, 1);
    }
}
