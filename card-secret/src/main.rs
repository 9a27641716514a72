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

mod config;

use std::{env, fs, io, io::Read, io::Write, str::FromStr};

use card_secret::{
    environment::Environment, issuer::SessionKeyIssuer, wire::CardSecretsResponse,
    SymmetricSecret,
};
use card_types::*;
use clap::Parser;
use config::{Command, Config, LineArgs, LogConfig};
use log::{error, info, LevelFilter};
use serde::Serialize;
use zeroize::Zeroizing;

const LOG_PATTERN: &str = "[{d}] [{t}] [{l}] {m}{n}";

#[derive(Serialize)]
struct IssueOutput<'a> {
    environment: Environment,
    secret: &'a str,
    session_id: &'a str,
}

// init log
fn init_log(log_config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
    use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
    use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
    use log4rs::append::rolling_file::RollingFileAppender;
    use log4rs::config::{Appender, Config, Logger, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let log_level = log_config
        .log_level
        .as_deref()
        .and_then(|level| LevelFilter::from_str(level).ok())
        .unwrap_or(LevelFilter::Info);
    let log_file_name = log_config.log_file_name.clone().unwrap_or_default();
    let monitor_log_file_name = log_config.monitor_log_file_name.clone().unwrap_or_default();
    let log_window_size = log_config.log_window_size.unwrap_or(10);
    let size_limit = log_config.log_size_limit.unwrap_or(100) * 1024 * 1024;

    // stdout carries command output, console logging goes to stderr
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let fixed_window_roller =
        FixedWindowRoller::builder().build(&(log_file_name.clone() + ".{}"), log_window_size)?;
    let compound_policy =
        CompoundPolicy::new(Box::new(SizeTrigger::new(size_limit)), Box::new(fixed_window_roller));
    let card_secret_log = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&log_file_name, Box::new(compound_policy))?;

    let fixed_window_roller = FixedWindowRoller::builder()
        .build(&(monitor_log_file_name.clone() + ".{}"), log_window_size)?;
    let compound_policy =
        CompoundPolicy::new(Box::new(SizeTrigger::new(size_limit)), Box::new(fixed_window_roller));
    let monitor_log = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&monitor_log_file_name, Box::new(compound_policy))?;

    let mut root_builder = Root::builder().appender("card_secret_log");
    if log_config.enable_console_logger.unwrap_or(true) {
        root_builder = root_builder.appender("stderr");
    }

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .appender(Appender::builder().build("monitor_log", Box::new(monitor_log)))
        .appender(Appender::builder().build("card_secret_log", Box::new(card_secret_log)))
        .logger(
            Logger::builder()
                .appender("monitor_log")
                .additive(false)
                .build("monitor", log_level),
        )
        .build(root_builder.build(log_level))?;

    log4rs::init_config(config)?;
    Ok(())
}

fn read_response(source: &str) -> CardResult<String> {
    let body = if source == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body).map(|_| body)
    } else {
        fs::read_to_string(source)
    };
    body.map_err(|e| {
        errno!(
            CardStatus::invalid_input(InputField::Data),
            "read response {} error: {}",
            source,
            e
        )
    })
}

// fixed secrets make the symmetric secret predictable
fn check_secret_override(secret: &Option<String>, production_build: bool) -> CardResult<()> {
    if production_build && secret.is_some() {
        return_errno!(
            CardStatus::invalid_input(InputField::Secret),
            "fixed secrets are disabled in production builds"
        );
    }
    Ok(())
}

fn read_secret(secret_env: &str) -> CardResult<SymmetricSecret> {
    // the variable's value is never echoed into the error
    let secret = Zeroizing::new(env::var(secret_env).map_err(|_| {
        errno!(
            CardStatus::invalid_input(InputField::Secret),
            "secret variable {} is unset or not unicode",
            secret_env
        )
    })?);
    SymmetricSecret::from_hex(secret.trim())
}

fn write_output<W: Write>(out: &mut W, text: &str) -> CardResult<()> {
    writeln!(out, "{}", text)
        .map_err(|e| errno!(CardStatus::InternalErr, "write output error: {}", e))
}

fn run<W: Write>(cfg: Config, command: Command, out: &mut W) -> CardResult<()> {
    let environment = Environment::from_str(cfg.environment.as_deref().unwrap_or("sandbox"))?;

    match command {
        Command::Issue { secret } => {
            check_secret_override(&secret, cfg!(feature = "production"))?;
            // keys are checked before any request is served
            let issuer = SessionKeyIssuer::new(cfg.public_keys.load()?);
            let (secret, token) = issuer.issue_session_token(environment, secret.as_deref())?;
            let output = IssueOutput {
                environment,
                secret: secret.as_hex(),
                session_id: token.as_str(),
            };
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| errno!(CardStatus::InternalErr, "encode output error: {}", e))?;
            write_output(out, &json)?;
        }
        Command::Reveal {
            secret_env,
            response,
        } => {
            let secret = read_secret(&secret_env)?;
            let response = CardSecretsResponse::from_json(&read_response(&response)?)?;
            let secrets = response.reveal(&secret)?;
            write_output(out, &format!("PAN: {}", secrets.pan.expose()))?;
            write_output(out, &format!("CVC: {}", secrets.cvc.expose()))?;
        }
    }
    Ok(())
}

fn main() {
    // Parse whole args with clap
    let args = LineArgs::parse();
    let cfg = match Config::load(&args.config_path, args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", e.retcode().as_str(), e);
            std::process::exit(e.code() as i32);
        }
    };

    // init log
    if let Err(e) = init_log(&cfg.log_config) {
        eprintln!("failed to init log: {}", e);
        std::process::exit(CardStatusT::Internal as i32);
    }
    info!(
        "card-secret started, environment {:?}",
        cfg.environment.as_deref()
    );

    if let Err(e) = run(cfg, args.command, &mut io::stdout().lock()) {
        error!("{}", e);
        eprintln!("{}", e.retcode().as_str());
        std::process::exit(e.code() as i32);
    }
}
