// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! The `AccessToken` data type and the claims it carries.

use crate::model::UserId;
use iii_iv_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of an access token.  Our tokens are much shorter than this but we want to
/// reject garbage early.
const MAX_TOKEN_LENGTH: usize = 4096;

/// An opaque type representing a user's access token.
///
/// Access tokens are signed JWTs, which means they are made of three base64url-encoded segments
/// separated by periods.  This type only validates the character set.  Validating the signature
/// and the claims is the job of the driver.
#[derive(Clone, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new access token from an untrusted string.
    pub fn new<S: Into<String>>(token: S) -> ModelResult<Self> {
        let token = token.into();
        if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
            return Err(ModelError("Invalid access token".to_owned()));
        }
        for ch in token.chars() {
            if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.') {
                return Err(ModelError("Invalid access token".to_owned()));
            }
        }
        Ok(Self(token))
    }

    /// Returns the string representation of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed access token")
    }
}

/// Contents of an access token.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserId,

    /// Time at which the token was issued, in seconds since the epoch.
    pub iat: i64,

    /// Time at which the token stops being valid, in seconds since the epoch.
    pub exp: i64,
}
