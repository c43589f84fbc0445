use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token and session lifetime, in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub log_level: LevelFilter,
    pub notification_queue_capacity: usize,
    pub login_max_attempts: usize,
    pub login_attempt_window_secs: u64,
    pub cors_origins: Vec<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage
                .parse::<i64>()
                .expect("JWT_MAXAGE must be a number of minutes"),
            port: env_or("PORT", 8000),
            log_level: env_or("LOG_LEVEL", LevelFilter::DEBUG),
            notification_queue_capacity: env_or("NOTIFICATION_QUEUE_CAPACITY", 256),
            login_max_attempts: env_or("LOGIN_MAX_ATTEMPTS", 5),
            login_attempt_window_secs: env_or("LOGIN_ATTEMPT_WINDOW_SECS", 300),
            cors_origins,
        }
    }
}
