use axum::http::HeaderValue;
use clap::Parser;
use std::net::SocketAddr;

/// Caching proxy for the khelinfo cricket frontend
#[derive(Parser, Debug, Clone)]
#[command(name = "khelinfo-proxy", version, about)]
pub struct Config {
    /// SportMonks access token, attached to every upstream request
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// SportMonks cricket API base URL
    #[arg(
        long,
        env = "SPORTMONKS_API_URL",
        default_value = "https://cricket.sportmonks.com/api/v2.0"
    )]
    pub sportmonks_api_url: String,

    /// NewsAPI key; /api/news answers 500 without it
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// NewsAPI base URL
    #[arg(long, env = "NEWS_API_URL", default_value = "https://newsapi.org")]
    pub news_api_url: String,

    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    pub listen_addr: String,

    /// Frontend origins allowed by CORS (comma-separated)
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,https://khelinfo-frontend.vercel.app"
    )]
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_token.trim().is_empty() {
            anyhow::bail!("API_TOKEN must not be empty");
        }
        self.listen_addr()?;
        self.allowed_origins()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid LISTEN_ADDR '{}': {}", self.listen_addr, e))
    }

    pub fn allowed_origins(&self) -> anyhow::Result<Vec<HeaderValue>> {
        let origins = self
            .cors_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/'))
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|e| anyhow::anyhow!("invalid CORS origin '{}': {}", o, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if origins.is_empty() {
            anyhow::bail!("CORS_ORIGINS must list at least one origin");
        }
        Ok(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["khelinfo-proxy"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--api-token", "tok"]);
        config.validate().unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 5000);
        assert_eq!(
            config.allowed_origins().unwrap(),
            vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("https://khelinfo-frontend.vercel.app"),
            ]
        );
    }

    #[test]
    fn test_custom_origins_trimmed() {
        let config = parse(&[
            "--api-token",
            "tok",
            "--cors-origins",
            "https://a.example/, https://b.example",
        ]);
        let origins = config.allowed_origins().unwrap();
        assert_eq!(origins[0], "https://a.example");
        assert_eq!(origins[1], "https://b.example");
    }

    #[test]
    fn test_blank_token_rejected() {
        let config = parse(&["--api-token", "  "]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let config = parse(&["--api-token", "tok", "--listen-addr", "localhost"]);
        assert!(config.validate().is_err());
    }
}
