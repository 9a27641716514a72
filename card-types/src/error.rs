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

use std::fmt;
use thiserror::Error;

use crate::retcode::*;

/// Which input of a request failed validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputField {
    /// ciphertext ‖ tag returned by the issuing service
    Data,
    /// initialization vector returned by the issuing service
    Iv,
    /// local hex-encoded symmetric secret
    Secret,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InputField::Data => "data",
            InputField::Iv => "iv",
            InputField::Secret => "secret",
        };
        f.write_str(name)
    }
}

// define error type of card secret retrieval
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum CardStatus {
    // malformed hex secret, empty ciphertext or iv
    #[error("invalid input: {field}")]
    InvalidInput { field: InputField },

    // gcm tag did not verify: tampering, wrong key or protocol mismatch
    #[error("authentication failure")]
    AuthenticationFailure,

    // base64 or utf-8 decoding failed
    #[error("decoding error")]
    DecodingError,

    // deployment level, not recoverable per request
    #[error("key configuration error")]
    KeyConfigurationError,

    #[error("internal error")]
    InternalErr,
}

impl CardStatus {
    pub fn invalid_input(field: InputField) -> CardStatus {
        CardStatus::InvalidInput { field }
    }
}

pub fn map_cardstatus_to_retcode(err: CardStatus) -> CardStatusT {
    match err {
        CardStatus::InvalidInput {
            field: InputField::Data,
        } => CardStatusT::InvalidData,
        CardStatus::InvalidInput {
            field: InputField::Iv,
        } => CardStatusT::InvalidIv,
        CardStatus::InvalidInput {
            field: InputField::Secret,
        } => CardStatusT::InvalidSecret,
        CardStatus::AuthenticationFailure => CardStatusT::AuthenticationFailure,
        CardStatus::DecodingError => CardStatusT::DecodingError,
        CardStatus::KeyConfigurationError => CardStatusT::KeyConfiguration,
        CardStatus::InternalErr => CardStatusT::Internal,
    }
}

pub fn map_cardstatus_to_u32(err: CardStatus) -> u32 {
    map_cardstatus_to_retcode(err) as u32
}

pub type CardResult<T> = core::result::Result<T, Error>;

#[macro_export]
macro_rules! card_assert {
    ($cond: expr, $errno_expr: expr, $($arg:tt)*) => {{
        if !$cond {
            return_errno!($errno_expr, $($arg)*)
        }
    }}
}

#[macro_export]
macro_rules! errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        let inner_error = {
            let errno: CardStatus = $errno_expr;
            let msg: String = format!($($arg)*);
            (errno, msg)
        };
        let error = Error::embedded(inner_error, Some(ErrorLocation::new(file!(), line!())));
        error
    }};
}

#[macro_export]
macro_rules! return_errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        return Err(errno!($errno_expr, $($arg)*));
    }};
}

#[derive(Debug)]
pub struct Error {
    inner: Error__,
    location: Option<ErrorLocation>,
    cause: Option<Box<Error>>,
}

#[derive(Debug)]
enum Error__ {
    Embedded((CardStatus, String)),
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorLocation {
    line: u32,
    file: &'static str,
}

impl Error {
    pub fn embedded(inner: (CardStatus, String), location_para: Option<ErrorLocation>) -> Error {
        Error {
            inner: Error__::Embedded(inner),
            location: location_para,
            cause: None,
        }
    }

    pub fn errno(&self) -> CardStatus {
        match &self.inner {
            Error__::Embedded((errno, _)) => *errno,
        }
    }

    pub fn message(&self) -> &str {
        match &self.inner {
            Error__::Embedded((_, msg)) => msg,
        }
    }

    pub fn retcode(&self) -> CardStatusT {
        map_cardstatus_to_retcode(self.errno())
    }

    /// Stable numeric code for operator-facing surfaces.
    pub fn code(&self) -> u32 {
        map_cardstatus_to_u32(self.errno())
    }

    pub fn with_cause(mut self, cause: Error) -> Error {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn get_cause(&self) -> &Option<Box<Error>> {
        &self.cause
    }
}

impl ErrorLocation {
    pub fn new(file_para: &'static str, line_para: u32) -> ErrorLocation {
        ErrorLocation {
            file: file_para,
            line: line_para,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "inner: {}; ", self.inner)?;
        if let Some(location) = self.location {
            write!(f, "location: {}", location)?;
        }
        Ok(())
    }
}

impl fmt::Display for Error__ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error__::Embedded((errno, msg)) => write!(f, "errno: {}, {}", errno, msg),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line = {}, file = {}]", self.line, self.file)
    }
}
