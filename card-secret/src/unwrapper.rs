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

use crate::issuer::SymmetricSecret;
use crate::utils::crypto::aes_gcm;
use crate::utils::encoding::{base64_decode, base64_encode, decode_secret_hex};
use card_types::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// One encrypted card field as returned by the issuing service.
///
/// `data` is base64 of the AES-128-GCM ciphertext with the 16 byte tag
/// appended; `iv` is base64 of the nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFieldPayload {
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub data: String,
}

impl EncryptedFieldPayload {
    pub fn new(iv: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            iv: iv.into(),
            data: data.into(),
        }
    }
}

/// Plaintext card field (PAN or CVC).
///
/// Never logged, stored or cached: `Debug` is redacted, the buffer is wiped
/// on drop and the value is only reachable through [`DecryptedField::expose`].
pub struct DecryptedField(Zeroizing<String>);

impl DecryptedField {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DecryptedField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DecryptedField(<redacted>)")
    }
}

/// Authenticated decryption of one field returned by the issuing service.
///
/// Inputs are checked in order `data`, `iv`, `secret` and each failure names
/// its field, before any decoding or cryptographic work. A tag that does not
/// verify is [`CardStatus::AuthenticationFailure`]; never retry it with the
/// same secret and payload.
pub fn decrypt_field(payload: &EncryptedFieldPayload, secret: &str) -> CardResult<DecryptedField> {
    card_assert!(
        !payload.data.is_empty(),
        CardStatus::invalid_input(InputField::Data),
        "data is empty"
    );
    card_assert!(
        !payload.iv.is_empty(),
        CardStatus::invalid_input(InputField::Iv),
        "iv is empty"
    );
    let key = decode_secret_hex(secret)?;

    let data = base64_decode(InputField::Data, &payload.data)?;
    let iv = base64_decode(InputField::Iv, &payload.iv)?;
    let plaintext = aes_gcm::open(&key, &iv, &data)?;
    debug!(
        "opened {} byte field with {} byte iv",
        plaintext.len(),
        iv.len()
    );

    let text = std::str::from_utf8(&plaintext)
        .map_err(|e| errno!(CardStatus::DecodingError, "field is not utf-8: {}", e))?;
    // The issuing service pads plaintext. Trimming every field is kept for
    // compatibility; a CVC with significant edge whitespace would be altered.
    Ok(DecryptedField(Zeroizing::new(text.trim().to_owned())))
}

/// [`decrypt_field`] with an already validated secret.
pub fn decrypt_field_with(
    payload: &EncryptedFieldPayload,
    secret: &SymmetricSecret,
) -> CardResult<DecryptedField> {
    decrypt_field(payload, secret.as_hex())
}

/// Seal `plaintext` under `secret` with a fresh random iv, in the layout the
/// issuing service produces. Used by sandbox tooling and tests.
pub fn seal_field(plaintext: &str, secret: &SymmetricSecret) -> CardResult<EncryptedFieldPayload> {
    let key = secret.key_bytes()?;
    let iv = aes_gcm::random_iv()?;
    let data = aes_gcm::seal(&key, &iv, plaintext.as_bytes())?;
    Ok(EncryptedFieldPayload::new(
        base64_encode(iv),
        base64_encode(data),
    ))
}
