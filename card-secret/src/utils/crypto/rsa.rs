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

use crate::utils::crypto::{decrypter::Decrypter, encrypter::Encrypter};
use card_types::*;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private, Public};
use openssl::rsa::{Padding, Rsa};

const PKCS1_PUBLIC_KEY_HEADER: &str = "-----BEGIN RSA PUBLIC KEY-----";

// OAEP is mandatory, PKCS1 v1.5 and raw RSA are never used.
const RSA_PADDING: Padding = Padding::PKCS1_OAEP;

fn ensure_rsa<T: HasPublic>(key: &PKeyRef<T>) -> CardResult<()> {
    key.rsa().map_err(|e| {
        errno!(
            CardStatus::KeyConfigurationError,
            "key is not an rsa key: {:?}",
            e
        )
    })?;
    Ok(())
}

#[derive(Debug)]
pub struct RsaPublicKeyHolder {
    public_key: PKey<Public>,
}

impl RsaPublicKeyHolder {
    // Parse either X509 `SubjectPublicKeyInfo` or pkcs#1 pem
    pub fn from_pem(pem: &str) -> CardResult<RsaPublicKeyHolder> {
        if pem.trim_start().starts_with(PKCS1_PUBLIC_KEY_HEADER) {
            Self::public_key_from_pem_pkcs1(pem)
        } else {
            Self::public_key_from_pem(pem)
        }
    }

    // Parse X509 `SubjectPublicKeyInfo` pem
    pub fn public_key_from_pem(pem: &str) -> CardResult<RsaPublicKeyHolder> {
        let public_key = PKey::public_key_from_pem(pem.as_bytes()).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "parse X509 public key error: {:?}",
                e
            )
        })?;
        ensure_rsa(&*public_key)?;
        Ok(RsaPublicKeyHolder { public_key })
    }

    // Parse pkcs#1 public key pem
    pub fn public_key_from_pem_pkcs1(pem: &str) -> CardResult<RsaPublicKeyHolder> {
        let public_key = Rsa::public_key_from_pem_pkcs1(pem.as_bytes()).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "parse pkcs#1 public key error: {:?}",
                e
            )
        })?;
        let public_key = PKey::from_rsa(public_key).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "convert rsa to pkey error: {:?}",
                e
            )
        })?;
        Ok(RsaPublicKeyHolder { public_key })
    }

    pub fn bits(&self) -> u32 {
        self.public_key.bits()
    }

    // public key in X509 `SubjectPublicKeyInfo` DER, used to compare keys
    pub fn public_key_to_der(&self) -> CardResult<Vec<u8>> {
        self.public_key
            .public_key_to_der()
            .map_err(|e| errno!(CardStatus::InternalErr, "encode public key error: {:?}", e))
    }
}

impl Encrypter for RsaPublicKeyHolder {
    // RSA encrypt with PKCS1_OAEP padding
    fn encrypt(&self, data: &[u8]) -> CardResult<Vec<u8>> {
        let mut encrypter = openssl::encrypt::Encrypter::new(&self.public_key).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "encrypter init error: {:?}",
                e
            )
        })?;
        encrypter.set_rsa_padding(RSA_PADDING).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "set rsa padding error: {}",
                e
            )
        })?;
        // Create an output buffer
        let buffer_len = encrypter.encrypt_len(data).map_err(|e| {
            errno!(
                CardStatus::InternalErr,
                "get cipher_text length error: {}",
                e
            )
        })?;
        let mut encrypted = vec![0; buffer_len];
        // a key too small for the OAEP overhead fails here
        let encrypted_len = encrypter.encrypt(data, &mut encrypted).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "rsa oaep encrypt error: {:?}",
                e
            )
        })?;
        encrypted.truncate(encrypted_len);
        Ok(encrypted)
    }
}

/// Holder of the issuing service's side of the handshake.
///
/// Only sandbox tooling and tests hold a private key; production deployments
/// are configured with public keys alone.
pub struct RsaPrivateKeyHolder {
    private_key: PKey<Private>,
}

impl RsaPrivateKeyHolder {
    // Parse pkcs#8 private key pem
    pub fn private_key_from_pem(pem: &str) -> CardResult<RsaPrivateKeyHolder> {
        let private_key = PKey::private_key_from_pem(pem.as_bytes()).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "parse pkcs#8 private key error: {:?}",
                e
            )
        })?;
        ensure_rsa(&*private_key)?;
        Ok(RsaPrivateKeyHolder { private_key })
    }

    // Parse pkcs#1 private key pem
    pub fn private_key_from_pem_pkcs1(pem: &str) -> CardResult<RsaPrivateKeyHolder> {
        let private_key = Rsa::private_key_from_pem(pem.as_bytes()).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "parse pkcs#1 private key error: {:?}",
                e
            )
        })?;
        let private_key = PKey::from_rsa(private_key).map_err(|e| {
            errno!(
                CardStatus::KeyConfigurationError,
                "convert rsa to pkey error: {}",
                e
            )
        })?;
        Ok(RsaPrivateKeyHolder { private_key })
    }
}

impl Decrypter for RsaPrivateKeyHolder {
    // RSA decrypt with PKCS1_OAEP padding
    fn decrypt(&self, encrypted: &[u8]) -> CardResult<Vec<u8>> {
        let mut decrypter = openssl::encrypt::Decrypter::new(&self.private_key)
            .map_err(|e| errno!(CardStatus::InternalErr, "decrypter init error: {}", e))?;
        decrypter
            .set_rsa_padding(RSA_PADDING)
            .map_err(|e| errno!(CardStatus::InternalErr, "set rsa padding error: {}", e))?;
        // Create an output buffer
        let buffer_len = decrypter.decrypt_len(encrypted).map_err(|e| {
            errno!(
                CardStatus::InternalErr,
                "get plain_text length error: {}",
                e
            )
        })?;
        let mut decrypted = vec![0u8; buffer_len];
        // wrong key or a modified token fails the OAEP check
        let decrypted_len = decrypter.decrypt(encrypted, &mut decrypted).map_err(|e| {
            errno!(
                CardStatus::AuthenticationFailure,
                "rsa oaep decrypt error: {}",
                e
            )
        })?;
        decrypted.truncate(decrypted_len);
        Ok(decrypted)
    }
}
