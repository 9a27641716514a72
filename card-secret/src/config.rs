// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use card_secret::keys::PublicKeyConfiguration;
use card_types::*;
use clap::{Parser, Subcommand};
use merge::Merge;
use serde::Deserialize;
use std::{fs, fs::File, io::BufReader, path::Path};

#[derive(Parser)]
#[clap(name = "card-secret", about = "Issue card secret sessions and reveal card data")]
pub struct LineArgs {
    #[clap(long = "config_path", default_value = "conf/config.yaml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[clap(flatten)]
    pub config: Config,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Issue a session secret and token for the configured environment
    Issue {
        /// fixed 32 hex character secret, for deterministic testing only
        #[clap(long)]
        secret: Option<String>,
    },
    /// Decrypt a saved card secrets response
    Reveal {
        /// environment variable holding the secret returned by `issue`,
        /// kept off the command line and out of shell history
        #[clap(long = "secret_env", default_value = "CARD_SECRET")]
        secret_env: String,
        /// response json file, `-` reads stdin
        #[clap(long, default_value = "-")]
        response: String,
    },
}

#[derive(Parser, Deserialize, Merge, Default, Debug)]
#[serde(default)]
pub struct Config {
    /// sandbox or production
    #[clap(long)]
    pub environment: Option<String>,
    /// issuing service public keys
    #[clap(flatten)]
    pub public_keys: PublicKeysConfig,
    /// log config
    #[clap(flatten)]
    pub log_config: LogConfig,
}

#[derive(Parser, Deserialize, Merge, Default, Debug)]
#[serde(default)]
pub struct PublicKeysConfig {
    /// sandbox public key pem file
    #[clap(long = "public_keys.sandbox_public_key_path")]
    pub sandbox_public_key_path: Option<String>,
    /// production public key pem file
    #[clap(long = "public_keys.production_public_key_path")]
    pub production_public_key_path: Option<String>,
    // inline pem, takes precedence over the path
    #[clap(skip)]
    pub sandbox_public_key_pem: Option<String>,
    #[clap(skip)]
    pub production_public_key_pem: Option<String>,
}

#[derive(Parser, Deserialize, Merge, Default, Debug)]
#[serde(default)]
pub struct LogConfig {
    /// log file name
    #[clap(long = "log_config.log_file_name")]
    pub log_file_name: Option<String>,
    /// monitor log file name
    #[clap(long = "log_config.monitor_log_file_name")]
    pub monitor_log_file_name: Option<String>,
    /// log level
    #[clap(long = "log_config.log_level")]
    pub log_level: Option<String>,
    /// enable console logger, written to stderr
    #[clap(long = "log_config.enable_console_logger")]
    pub enable_console_logger: Option<bool>,
    /// log window size
    #[clap(long = "log_config.log_window_size")]
    pub log_window_size: Option<u32>,
    /// log size limit, MB
    #[clap(long = "log_config.log_size_limit")]
    pub log_size_limit: Option<u64>,
}

impl Config {
    /// Merge command line values over the yaml file, then fill defaults.
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: &Path, args: Config) -> CardResult<Config> {
        let mut config = args;
        if let Ok(f) = File::open(config_path) {
            let file_config = Self::from_reader(BufReader::new(f)).map_err(|e| {
                errno!(
                    CardStatus::KeyConfigurationError,
                    "error in configuration file {}",
                    config_path.display()
                )
                .with_cause(e)
            })?;
            config.merge(file_config);
        }
        config.merge(Config::defaults());
        Ok(config)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> CardResult<Config> {
        serde_yaml::from_reader::<_, Config>(reader).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "parse yaml config error: {}",
                e
            )
        })
    }

    fn defaults() -> Config {
        Config {
            environment: Some("sandbox".to_owned()),
            public_keys: PublicKeysConfig::default(),
            log_config: LogConfig {
                log_file_name: Some("logs/card_secret.log".to_owned()),
                monitor_log_file_name: Some("logs/card_secret_monitor.log".to_owned()),
                log_level: Some("info".to_owned()),
                enable_console_logger: Some(true),
                log_window_size: Some(10),
                log_size_limit: Some(100),
            },
        }
    }
}

impl PublicKeysConfig {
    pub fn load(&self) -> CardResult<PublicKeyConfiguration> {
        let sandbox = read_pem(
            "sandbox",
            &self.sandbox_public_key_pem,
            &self.sandbox_public_key_path,
        )?;
        let production = read_pem(
            "production",
            &self.production_public_key_pem,
            &self.production_public_key_path,
        )?;
        PublicKeyConfiguration::from_pems(&sandbox, &production)
    }
}

fn read_pem(name: &str, pem: &Option<String>, path: &Option<String>) -> CardResult<String> {
    match (pem, path) {
        (Some(pem), _) => Ok(pem.clone()),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "read {} public key {} error: {}",
                name,
                path,
                e
            )
        }),
        (None, None) => return_errno!(
            CardStatus::KeyConfigurationError,
            "no {} public key configured",
            name
        ),
    }
}
