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

//! Card secret retrieval: issue a session token for the card issuing
//! service, then decrypt the PAN and CVC it returns.

pub mod environment;
pub mod issuer;
pub mod keys;
pub mod unwrapper;
pub mod utils;
pub mod wire;

pub use environment::Environment;
pub use issuer::{SessionKeyIssuer, SessionToken, SymmetricSecret};
pub use keys::PublicKeyConfiguration;
pub use unwrapper::{decrypt_field, DecryptedField, EncryptedFieldPayload};
pub use wire::{CardSecrets, CardSecretsResponse, SESSION_ID_HEADER};
