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

use crate::environment::Environment;
use crate::utils::crypto::rsa::RsaPublicKeyHolder;
use card_types::*;
use log::{info, warn};

// below this size the key is accepted but flagged at startup
const RECOMMENDED_RSA_BITS: u32 = 2048;

/// The issuing service's public keys, one per [`Environment`].
///
/// Built once at process start from configuration and shared read-only
/// afterwards; rotating a key means restarting with new configuration.
#[derive(Debug)]
pub struct PublicKeyConfiguration {
    sandbox: RsaPublicKeyHolder,
    production: RsaPublicKeyHolder,
}

impl PublicKeyConfiguration {
    pub fn new(sandbox: RsaPublicKeyHolder, production: RsaPublicKeyHolder) -> Self {
        Self {
            sandbox,
            production,
        }
    }

    /// Parse both PEM keys. A key that does not parse, or is not RSA, is a
    /// [`CardStatus::KeyConfigurationError`] naming the environment.
    pub fn from_pems(sandbox_pem: &str, production_pem: &str) -> CardResult<Self> {
        let sandbox = parse_key(Environment::Sandbox, sandbox_pem)?;
        let production = parse_key(Environment::Production, production_pem)?;
        Ok(Self::new(sandbox, production))
    }

    pub fn select(&self, environment: Environment) -> &RsaPublicKeyHolder {
        match environment {
            Environment::Sandbox => &self.sandbox,
            Environment::Production => &self.production,
        }
    }
}

fn parse_key(environment: Environment, pem: &str) -> CardResult<RsaPublicKeyHolder> {
    let key = RsaPublicKeyHolder::from_pem(pem).map_err(|e| {
        errno!(
            CardStatus::KeyConfigurationError,
            "invalid {} public key",
            environment
        )
        .with_cause(e)
    })?;
    if key.bits() < RECOMMENDED_RSA_BITS {
        warn!(
            "{} public key is {} bits, below the recommended {}",
            environment,
            key.bits(),
            RECOMMENDED_RSA_BITS
        );
    }
    info!("loaded {} public key, {} bits", environment, key.bits());
    Ok(key)
}

#[cfg(test)]
mod test {
    use super::*;
    use openssl::rsa::Rsa;

    fn public_pem(bits: u32) -> String {
        let rsa = Rsa::generate(bits).expect("create rsa key pair failed");
        String::from_utf8(rsa.public_key_to_pem().unwrap()).unwrap()
    }

    #[test]
    fn select_returns_matching_key() {
        let sandbox_pem = public_pem(2048);
        let production_pem = public_pem(2048);
        let keys = PublicKeyConfiguration::from_pems(&sandbox_pem, &production_pem).unwrap();

        let sandbox_der = RsaPublicKeyHolder::from_pem(&sandbox_pem)
            .unwrap()
            .public_key_to_der()
            .unwrap();
        let production_der = RsaPublicKeyHolder::from_pem(&production_pem)
            .unwrap()
            .public_key_to_der()
            .unwrap();
        assert_eq!(
            keys.select(Environment::Sandbox).public_key_to_der().unwrap(),
            sandbox_der
        );
        assert_eq!(
            keys.select(Environment::Production)
                .public_key_to_der()
                .unwrap(),
            production_der
        );
        assert_ne!(sandbox_der, production_der);
    }

    #[test]
    fn bad_production_key_is_reported() {
        let sandbox_pem = public_pem(2048);
        let err = PublicKeyConfiguration::from_pems(&sandbox_pem, "not a pem").unwrap_err();
        assert_eq!(err.errno(), CardStatus::KeyConfigurationError);
        assert!(err.message().contains("production"));
        assert_eq!(
            err.get_cause().as_ref().map(|c| c.errno()),
            Some(CardStatus::KeyConfigurationError)
        );
    }
}
