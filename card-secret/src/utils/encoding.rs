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

use base64::{engine::general_purpose, Engine as _};
use card_types::*;
use zeroize::Zeroizing;

// symmetric secret is 128 bit(16 byte)
pub const SECRET_LEN: usize = 16;
// rendered as lowercase or uppercase hex
pub const SECRET_HEX_LEN: usize = SECRET_LEN * 2;

pub fn is_secret_hex(secret: &str) -> bool {
    secret.len() == SECRET_HEX_LEN && secret.bytes().all(|b| b.is_ascii_hexdigit())
}

// Decode a hex secret into raw key bytes, rejecting anything that is not
// exactly 32 hex characters.
pub fn decode_secret_hex(secret: &str) -> CardResult<Zeroizing<[u8; SECRET_LEN]>> {
    if !is_secret_hex(secret) {
        return_errno!(
            CardStatus::invalid_input(InputField::Secret),
            "secret must be {} hex characters, got {}",
            SECRET_HEX_LEN,
            secret.len()
        );
    }
    let mut key = Zeroizing::new([0u8; SECRET_LEN]);
    // error detail would echo a secret character
    hex::decode_to_slice(secret, &mut *key).map_err(|_| {
        errno!(
            CardStatus::invalid_input(InputField::Secret),
            "decode secret hex error"
        )
    })?;
    Ok(key)
}

pub fn base64_encode<T: AsRef<[u8]>>(data: T) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn base64_decode(field: InputField, encoded: &str) -> CardResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| errno!(CardStatus::DecodingError, "decode {} base64 error: {}", field, e))
}
