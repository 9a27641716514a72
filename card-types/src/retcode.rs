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

#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug)]
pub enum CardStatusT {
    Success = 0,
    Internal = 1,
    // 10 ~ 19: request could be retried after re-issuing a session
    InvalidData = 10,
    InvalidIv = 11,
    InvalidSecret = 12,
    DecodingError = 13,
    AuthenticationFailure = 14,
    // 20 ~: deployment errors, abort startup
    KeyConfiguration = 20,
}

impl CardStatusT {
    // operator facing text, never echoes secret material
    pub fn as_str(&self) -> &str {
        match *self {
            CardStatusT::Success => "Success",
            CardStatusT::Internal => "Internal error",
            CardStatusT::InvalidData => "Encrypted card data is missing or malformed",
            CardStatusT::InvalidIv => "Initialization vector is missing or malformed",
            CardStatusT::InvalidSecret => "Session secret is malformed",
            CardStatusT::DecodingError => "Card data could not be decoded",
            CardStatusT::AuthenticationFailure => {
                "Card data failed authentication, request a new session"
            }
            CardStatusT::KeyConfiguration => "Public key configuration is invalid",
        }
    }
}
