use env_logger::Env;

/// Set when the tracing subscriber should replace env_logger.
pub const TRACING_ENV: &str = "CONTENT_MAPPER_TRACING";

fn flag_set(value: Option<String>) -> bool {
    value
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn tracing_requested() -> bool {
    flag_set(std::env::var(TRACING_ENV).ok())
}

pub fn init_tracing_from_env() {
    // log:: macros are forwarded into tracing
    let _ = tracing_log::LogTracer::init();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Install the log backend selected by the environment. Default filter is `info`.
pub fn init_from_env() {
    if tracing_requested() {
        init_tracing_from_env();
    } else {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert!(flag_set(Some("1".into())));
        assert!(flag_set(Some("TRUE".into())));
        assert!(!flag_set(Some("0".into())));
        assert!(!flag_set(None));
    }
}
