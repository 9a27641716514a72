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

//! Shapes exchanged with the issuing service. The HTTP call itself belongs
//! to the caller.

use crate::issuer::{SessionToken, SymmetricSecret};
use crate::unwrapper::{decrypt_field_with, DecryptedField, EncryptedFieldPayload};
use card_types::*;
use log::info;
use serde::{Deserialize, Serialize};

/// Header carrying the [`SessionToken`] on the encrypted card fields request.
pub const SESSION_ID_HEADER: &str = "SessionId";

pub fn session_header(token: &SessionToken) -> (&'static str, &str) {
    (SESSION_ID_HEADER, token.as_str())
}

/// Response body of the encrypted card fields request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSecretsResponse {
    pub pan: EncryptedFieldPayload,
    pub cvc: EncryptedFieldPayload,
}

#[derive(Debug)]
pub struct CardSecrets {
    pub pan: DecryptedField,
    pub cvc: DecryptedField,
}

impl CardSecretsResponse {
    pub fn from_json(body: &str) -> CardResult<Self> {
        serde_json::from_str(body).map_err(|e| {
            errno!(
                CardStatus::DecodingError,
                "parse card secrets response error: {}",
                e
            )
        })
    }

    /// Decrypt both fields. The first failure is returned and nothing
    /// decrypted so far is kept.
    pub fn reveal(&self, secret: &SymmetricSecret) -> CardResult<CardSecrets> {
        let result = self.reveal_impl(secret);
        match &result {
            Ok(_) => info!(target: "monitor", "|reveal_card_secrets|{}|{}|", CardStatusT::Success as u32, "success"),
            Err(e) => info!(target: "monitor", "|reveal_card_secrets|{}|{}|", e.code(), e.errno()),
        }
        result
    }

    fn reveal_impl(&self, secret: &SymmetricSecret) -> CardResult<CardSecrets> {
        let pan = decrypt_field_with(&self.pan, secret)?;
        let cvc = decrypt_field_with(&self.cvc, secret)?;
        Ok(CardSecrets { pan, cvc })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::unwrapper::seal_field;

    #[test]
    fn reveal_both_fields() {
        let secret = SymmetricSecret::generate().unwrap();
        let response = CardSecretsResponse {
            pan: seal_field("4242424242424242", &secret).unwrap(),
            cvc: seal_field("123 ", &secret).unwrap(),
        };
        let body = serde_json::to_string(&response).unwrap();

        let parsed = CardSecretsResponse::from_json(&body).unwrap();
        let secrets = parsed.reveal(&secret).unwrap();
        assert_eq!(secrets.pan.expose(), "4242424242424242");
        assert_eq!(secrets.cvc.expose(), "123");
    }

    #[test]
    fn cvc_failure_is_surfaced() {
        let secret = SymmetricSecret::generate().unwrap();
        let other = SymmetricSecret::generate().unwrap();
        let response = CardSecretsResponse {
            pan: seal_field("4242424242424242", &secret).unwrap(),
            cvc: seal_field("123", &other).unwrap(),
        };
        let err = response.reveal(&secret).unwrap_err();
        assert_eq!(err.errno(), CardStatus::AuthenticationFailure);
    }

    #[test]
    fn parses_service_json() {
        let body = r#"{
            "pan": { "iv": "AAAAAAAAAAAAAAAA", "data": "feSzYa2pkr7Xu05aVLOErz27FGld5aNXS1MVPLISI0o=" },
            "cvc": { "iv": "AAAAAAAAAAAAAAAA", "data": "afa2Yaq7rIx+bRcEFtx9sQr4J+jrJ0M=" }
        }"#;
        let response = CardSecretsResponse::from_json(body).unwrap();
        let secret = SymmetricSecret::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
        let secrets = response.reveal(&secret).unwrap();
        assert_eq!(secrets.pan.expose(), "4242424242424242");
        assert_eq!(secrets.cvc.expose(), "123");
    }

    #[test]
    fn malformed_json_is_decoding_error() {
        let err = CardSecretsResponse::from_json("{\"pan\": 1}").unwrap_err();
        assert_eq!(err.errno(), CardStatus::DecodingError);
    }

    #[test]
    fn header_name() {
        let token = SessionToken::from("dG9rZW4=".to_owned());
        assert_eq!(session_header(&token), ("SessionId", "dG9rZW4="));
    }
}
