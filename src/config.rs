//! Configuration management.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
    pub effects: EffectsConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub request_timeout_secs: u64,
    pub max_body_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Verification-only key material; the session provider owns the private half.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub public_key_b64: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct EffectsConfig {
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment();

        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: environment.clone(),
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("REQUEST_TIMEOUT_SECS must be a valid number"),
                max_body_size: env::var("MAX_BODY_SIZE")
                    .unwrap_or_else(|_| "1048576".to_string())
                    .parse()
                    .expect("MAX_BODY_SIZE must be a valid number"),
            },
            session: SessionConfig {
                public_key_b64: env::var("SESSION_PUBLIC_KEY").ok(),
                issuer: env::var("SESSION_ISSUER").ok(),
                audience: env::var("SESSION_AUDIENCE").ok(),
            },
            cors: Self::parse_cors_config(&environment),
            logging: Self::parse_logging_config(&environment),
            telemetry: TelemetryConfig {
                otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
                service_name: env::var("OTEL_SERVICE_NAME")
                    .unwrap_or_else(|_| "turnstile".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|v| v.parse().unwrap_or(true))
                    .unwrap_or(true),
            },
            effects: EffectsConfig {
                queue_capacity: env::var("EFFECT_QUEUE_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .expect("EFFECT_QUEUE_CAPACITY must be a valid number"),
            },
            store: StoreConfig {
                seed_demo_data: env::var("SEED_DEMO_DATA")
                    .map(|v| v.parse().unwrap_or(false))
                    .unwrap_or(environment.is_development()),
            },
        }
    }

    fn parse_environment() -> Environment {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    fn parse_cors_config(environment: &Environment) -> CorsConfig {
        let default_origins = if environment.is_development() {
            vec!["*".to_string()]
        } else {
            vec![]
        };

        let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or(default_origins);

        if environment.is_production() && allowed_origins.contains(&"*".to_string()) {
            eprintln!("WARNING: Using wildcard CORS origin in production is not recommended");
        }

        CorsConfig {
            allowed_origins,
            allowed_methods: env::var("CORS_ALLOWED_METHODS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "DELETE".to_string(),
                        "OPTIONS".to_string(),
                    ]
                }),
            allowed_headers: env::var("CORS_ALLOWED_HEADERS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "Content-Type".to_string(),
                        "Authorization".to_string(),
                        "X-Request-ID".to_string(),
                    ]
                }),
            allow_credentials: env::var("CORS_ALLOW_CREDENTIALS")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            max_age_secs: env::var("CORS_MAX_AGE_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("CORS_MAX_AGE_SECS must be a valid number"),
        }
    }

    fn parse_logging_config(environment: &Environment) -> LoggingConfig {
        let is_dev = environment.is_development();

        LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| {
                if is_dev {
                    "debug".to_string()
                } else {
                    "info".to_string()
                }
            }),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| {
                    if is_dev {
                        "pretty".to_string()
                    } else {
                        "json".to_string()
                    }
                })
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    pub fn validate_for_production(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.server.environment.is_production() {
            if self.session.public_key_b64.is_none() {
                issues.push("SESSION_PUBLIC_KEY must be set in production".to_string());
            }

            if self.cors.allowed_origins.contains(&"*".to_string()) {
                issues.push("CORS should not allow all origins (*) in production".to_string());
            }

            if self.store.seed_demo_data {
                issues.push("Demo seed data should not be enabled in production".to_string());
            }

            if self.effects.queue_capacity < 16 {
                issues.push(
                    "Side-effect queue capacity below 16 will drop jobs under light load"
                        .to_string(),
                );
            }
        }

        issues
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Config {
    pub fn default_for_testing() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                environment: Environment::Development,
                request_timeout_secs: 30,
                max_body_size: 1048576,
            },
            session: SessionConfig {
                public_key_b64: None,
                issuer: Some("turnstile-test".to_string()),
                audience: None,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                allowed_methods: vec![
                    "GET".to_string(),
                    "POST".to_string(),
                    "PUT".to_string(),
                    "DELETE".to_string(),
                ],
                allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                allow_credentials: false,
                max_age_secs: 3600,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            telemetry: TelemetryConfig {
                otlp_endpoint: None,
                service_name: "turnstile-test".to_string(),
                metrics_enabled: false,
            },
            effects: EffectsConfig {
                queue_capacity: 256,
            },
            store: StoreConfig {
                seed_demo_data: false,
            },
        }
    }
}
