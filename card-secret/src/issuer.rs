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
use crate::keys::PublicKeyConfiguration;
use crate::utils::crypto::{decrypter::Decrypter, encrypter::Encrypter};
use crate::utils::encoding::{
    base64_decode, base64_encode, decode_secret_hex, is_secret_hex, SECRET_LEN,
};
use card_types::*;
use log::{debug, info};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// One-time 128 bit symmetric secret, held as lowercase hex.
///
/// Lives for a single retrieval request and is wiped when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricSecret {
    hex: String,
}

impl SymmetricSecret {
    /// Draw 16 bytes from the OpenSSL CSPRNG.
    pub fn generate() -> CardResult<SymmetricSecret> {
        let mut key = Zeroizing::new([0u8; SECRET_LEN]);
        openssl::rand::rand_bytes(&mut *key)
            .map_err(|e| errno!(CardStatus::InternalErr, "rand secret failed: {:?}", e))?;
        Ok(SymmetricSecret {
            hex: hex::encode(&*key),
        })
    }

    /// Accept a caller supplied secret of exactly 32 hex characters.
    pub fn from_hex(secret: &str) -> CardResult<SymmetricSecret> {
        if !is_secret_hex(secret) {
            return_errno!(
                CardStatus::invalid_input(InputField::Secret),
                "secret must be 32 hex characters"
            );
        }
        Ok(SymmetricSecret {
            hex: secret.to_ascii_lowercase(),
        })
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    pub fn key_bytes(&self) -> CardResult<Zeroizing<[u8; SECRET_LEN]>> {
        decode_secret_hex(&self.hex)
    }
}

impl Drop for SymmetricSecret {
    fn drop(&mut self) {
        self.hex.zeroize();
    }
}

impl fmt::Debug for SymmetricSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SymmetricSecret(<redacted>)")
    }
}

/// base64 of the RSA-OAEP encryption of the secret's base64 text. Sent to
/// the issuing service as the `SessionId` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        SessionToken(token)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encrypt `secret` for the issuing service.
///
/// hex -> raw bytes -> base64 text -> utf-8 bytes -> RSA-OAEP -> base64 text.
/// The issuing service expects exactly this chain.
pub fn seal_session_token(
    encrypter: &dyn Encrypter,
    secret: &SymmetricSecret,
) -> CardResult<SessionToken> {
    let key = secret.key_bytes()?;
    let key_b64 = Zeroizing::new(base64_encode(&*key));
    let encrypted = encrypter.encrypt(key_b64.as_bytes())?;
    Ok(SessionToken(base64_encode(encrypted)))
}

/// Reverse of [`seal_session_token`], as the issuing service performs it.
pub fn open_session_token(
    decrypter: &dyn Decrypter,
    token: &SessionToken,
) -> CardResult<SymmetricSecret> {
    let encrypted = base64_decode(InputField::Data, token.as_str())?;
    let key_b64 = Zeroizing::new(decrypter.decrypt(&encrypted)?);
    let key_b64 = std::str::from_utf8(&key_b64)
        .map_err(|e| errno!(CardStatus::DecodingError, "token is not utf-8: {}", e))?;
    let key = Zeroizing::new(base64_decode(InputField::Secret, key_b64)?);
    card_assert!(
        key.len() == SECRET_LEN,
        CardStatus::invalid_input(InputField::Secret),
        "token carries {} key bytes, expected {}",
        key.len(),
        SECRET_LEN
    );
    Ok(SymmetricSecret {
        hex: hex::encode(&*key),
    })
}

/// Issues session tokens against the configured public keys.
///
/// Holds no mutable state; share it behind an `Arc` across threads.
#[derive(Debug)]
pub struct SessionKeyIssuer {
    keys: PublicKeyConfiguration,
}

impl SessionKeyIssuer {
    pub fn new(keys: PublicKeyConfiguration) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &PublicKeyConfiguration {
        &self.keys
    }

    /// Generate a secret and the session token that proves it.
    ///
    /// `secret` is a testing-only override for deterministic runs. Production
    /// callers pass `None`: a fixed value makes the symmetric secret
    /// predictable. A supplied secret is validated before any cryptographic
    /// step runs.
    ///
    /// The token differs between calls even for the same secret, since OAEP
    /// padding is randomized.
    pub fn issue_session_token(
        &self,
        environment: Environment,
        secret: Option<&str>,
    ) -> CardResult<(SymmetricSecret, SessionToken)> {
        let result = self.issue_session_token_impl(environment, secret);
        match &result {
            Ok(_) => {
                info!(target: "monitor", "|issue_session_token|{}|{}|{}|", environment, CardStatusT::Success as u32, "success")
            }
            Err(e) => {
                info!(target: "monitor", "|issue_session_token|{}|{}|{}|", environment, e.code(), e.errno())
            }
        }
        result
    }

    fn issue_session_token_impl(
        &self,
        environment: Environment,
        secret: Option<&str>,
    ) -> CardResult<(SymmetricSecret, SessionToken)> {
        let secret = match secret {
            Some(hex) => {
                debug!("using caller supplied secret");
                SymmetricSecret::from_hex(hex)?
            }
            None => SymmetricSecret::generate()?,
        };
        let token = seal_session_token(self.keys.select(environment), &secret)?;
        debug!("sealed session token for {} environment", environment);
        Ok((secret, token))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::crypto::rsa::RsaPrivateKeyHolder;
    use openssl::rsa::Rsa;
    use std::sync::Arc;

    const FIXED_SECRET: &str = "000102030405060708090a0b0c0d0e0f";

    struct Fixture {
        issuer: SessionKeyIssuer,
        sandbox_private: RsaPrivateKeyHolder,
        production_private: RsaPrivateKeyHolder,
    }

    fn fixture() -> Fixture {
        let sandbox = Rsa::generate(2048).expect("create rsa key pair failed");
        let production = Rsa::generate(2048).expect("create rsa key pair failed");
        let keys = PublicKeyConfiguration::from_pems(
            std::str::from_utf8(&sandbox.public_key_to_pem().unwrap()).unwrap(),
            std::str::from_utf8(&production.public_key_to_pem().unwrap()).unwrap(),
        )
        .unwrap();
        Fixture {
            issuer: SessionKeyIssuer::new(keys),
            sandbox_private: RsaPrivateKeyHolder::private_key_from_pem(
                std::str::from_utf8(&sandbox.private_key_to_pem().unwrap()).unwrap(),
            )
            .unwrap(),
            production_private: RsaPrivateKeyHolder::private_key_from_pem(
                std::str::from_utf8(&production.private_key_to_pem().unwrap()).unwrap(),
            )
            .unwrap(),
        }
    }

    #[test]
    fn generated_secret_is_lowercase_hex() {
        let f = fixture();
        let (secret, token) = f
            .issuer
            .issue_session_token(Environment::Sandbox, None)
            .unwrap();
        assert_eq!(secret.as_hex().len(), 32);
        assert!(secret
            .as_hex()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert!(!token.as_str().is_empty());

        let (other, _) = f
            .issuer
            .issue_session_token(Environment::Sandbox, None)
            .unwrap();
        assert_ne!(secret, other);
    }

    #[test]
    fn token_carries_base64_of_secret_bytes() {
        let f = fixture();
        let (secret, token) = f
            .issuer
            .issue_session_token(Environment::Production, Some(FIXED_SECRET))
            .unwrap();
        assert_eq!(secret.as_hex(), FIXED_SECRET);

        let encrypted = base64_decode(InputField::Data, token.as_str()).unwrap();
        let plain = f.production_private.decrypt(&encrypted).unwrap();
        assert_eq!(plain, b"AAECAwQFBgcICQoLDA0ODw==");

        let opened = open_session_token(&f.production_private, &token).unwrap();
        assert_eq!(opened, secret);
    }

    #[test]
    fn fixed_secret_is_reproducible_but_token_is_not() {
        let f = fixture();
        let (s1, t1) = f
            .issuer
            .issue_session_token(Environment::Sandbox, Some(FIXED_SECRET))
            .unwrap();
        let (s2, t2) = f
            .issuer
            .issue_session_token(Environment::Sandbox, Some(&FIXED_SECRET.to_uppercase()))
            .unwrap();
        assert_eq!(s1, s2);
        assert_ne!(t1, t2);
    }

    #[test]
    fn environments_never_cross() {
        let f = fixture();
        let (secret, token) = f
            .issuer
            .issue_session_token(Environment::Sandbox, None)
            .unwrap();
        assert_eq!(
            open_session_token(&f.sandbox_private, &token).unwrap(),
            secret
        );
        let err = open_session_token(&f.production_private, &token).unwrap_err();
        assert_eq!(err.errno(), CardStatus::AuthenticationFailure);

        let (secret, token) = f
            .issuer
            .issue_session_token(Environment::Production, None)
            .unwrap();
        assert_eq!(
            open_session_token(&f.production_private, &token).unwrap(),
            secret
        );
        assert!(open_session_token(&f.sandbox_private, &token).is_err());
    }

    #[test]
    fn malformed_secret_is_rejected() {
        let f = fixture();
        for bad in [
            "",
            "xyz",
            "000102030405060708090a0b0c0d0e0",
            "zz0102030405060708090a0b0c0d0e0f",
        ] {
            let err = f
                .issuer
                .issue_session_token(Environment::Sandbox, Some(bad))
                .unwrap_err();
            assert_eq!(err.errno(), CardStatus::invalid_input(InputField::Secret));
        }
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let secret = SymmetricSecret::from_hex(FIXED_SECRET).unwrap();
        let shown = format!("{:?}", secret);
        assert!(!shown.contains(FIXED_SECRET));
    }

    #[test]
    fn issuer_is_shared_across_threads() {
        let f = fixture();
        let issuer = Arc::new(f.issuer);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = Arc::clone(&issuer);
                std::thread::spawn(move || {
                    issuer
                        .issue_session_token(Environment::Sandbox, None)
                        .map(|(secret, _)| secret)
                })
            })
            .collect();
        for handle in handles {
            let secret = handle.join().unwrap().unwrap();
            let token = seal_session_token(issuer.keys().select(Environment::Sandbox), &secret)
                .unwrap();
            assert_eq!(
                open_session_token(&f.sandbox_private, &token).unwrap(),
                secret
            );
        }
    }
}
