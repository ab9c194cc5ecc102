use crate::error::Error;
use log::debug;
use serde::Deserialize;
use tokio::fs::read_to_string;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigBuilder {
    database: Option<Database>,
    web: Option<WebBuilder>,
    throttle: Option<ThrottleBuilder>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    username: String,
    password: String,
    host: String,
    database: String,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct WebBuilder {
    ip: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ThrottleBuilder {
    send_request_per_minute: Option<u32>,
}

impl ConfigBuilder {
    pub async fn load(path: String) -> Result<Self, Error> {
        debug!("loading config from: {path}");
        let raw = read_to_string(path).await?;

        let config = toml::from_str(&raw)?;

        Ok(config)
    }

    pub fn build(self) -> Config {
        let web = if let Some(web) = self.web {
            Web {
                ip: web.ip.unwrap_or(String::from("0.0.0.0")),
                port: web.port.unwrap_or(8080),
            }
        } else {
            Web {
                ip: String::from("0.0.0.0"),
                port: 8080,
            }
        };

        let send_request_per_minute = self
            .throttle
            .and_then(|t| t.send_request_per_minute)
            .unwrap_or(3);

        Config {
            database: self.database,
            web,
            throttle: Throttle {
                send_request_per_minute,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the server on the in-memory store
    pub database: Option<Database>,
    pub web: Web,
    pub throttle: Throttle,
}

#[derive(Debug, Clone)]
pub struct Web {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Throttle {
    pub send_request_per_minute: u32,
}

impl Database {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}
