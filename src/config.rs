use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        let max_connections = parse_max_connections(std::env::var("DATABASE_MAX_CONNECTIONS").ok())?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<String>) -> anyhow::Result<u32> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let parsed: u32 = value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {value}"))?;
            anyhow::ensure!(parsed > 0, "DATABASE_MAX_CONNECTIONS must be at least 1");
            Ok(parsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_connections_defaults_when_unset_or_blank() {
        assert_eq!(parse_max_connections(None).unwrap(), 5);
        assert_eq!(parse_max_connections(Some("  ".to_string())).unwrap(), 5);
    }

    #[test]
    fn max_connections_rejects_zero_and_garbage() {
        assert_eq!(parse_max_connections(Some("12".to_string())).unwrap(), 12);
        assert!(parse_max_connections(Some("0".to_string())).is_err());
        assert!(parse_max_connections(Some("many".to_string())).is_err());
    }
}
