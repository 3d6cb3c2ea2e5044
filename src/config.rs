use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use serde::Deserialize;

/// Server settings, layered from an optional config file and `MODEL_STORE_*`
/// environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_addr")]
    pub listen_addr: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: default_addr(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Settings {
    pub fn load(config_file: Option<PathBuf>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder();

        if let Some(config_file) = config_file {
            config_builder = config_builder.add_source(config::File::from(config_file));
        }

        let config = config_builder
            .add_source(
                config::Environment::with_prefix("MODEL_STORE")
                    .separator(".")
                    .prefix_separator("_"),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.listen_addr, self.port))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.listen_addr, self.port)
    }
}
