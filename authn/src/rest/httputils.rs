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

//! Utilities to deal with HTTP authorization.

use crate::model::AccessToken;
use http::header::HeaderMap;
use iii_iv_core::rest::{RestError, RestResult, get_unique_header};

/// The only authorization scheme supported by the service.
const SCHEME: &str = "Bearer";

/// Constructs an authentication error with `message` that asks the client for a bearer token.
fn unauthorized<S: Into<String>>(message: S) -> RestError {
    RestError::Unauthorized { scheme: SCHEME, message: message.into() }
}

/// Validates that the `Authorization` HTTP header contains a textual payload for the bearer
/// scheme and returns it.  The scheme name is matched case-insensitively.
fn get_authorization_header(headers: &HeaderMap) -> RestResult<&str> {
    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized("Missing Authorization header")),
        Err(e) => return Err(unauthorized(e.to_string())),
    };

    let authz = match authz.to_str() {
        Ok(value) => value,
        Err(e) => return Err(unauthorized(format!("Bad encoding in Authorization header: {}", e))),
    };

    let mut fields = authz.splitn(2, ' ');
    let scheme = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(unauthorized("Bad Authorization header: missing scheme")),
    };
    let payload = match fields.next() {
        Some(s) => s.trim(),
        None => return Err(unauthorized("Bad Authorization header: missing payload")),
    };

    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(unauthorized("Unsupported scheme"));
    }

    Ok(payload)
}

/// Assumes that the `headers` contain a bearer access token and extracts it.
///
/// This only validates the shape of the token.  The caller is responsible for resolving it into a
/// session via the driver.
pub fn get_bearer_auth(headers: &HeaderMap) -> RestResult<AccessToken> {
    let payload = get_authorization_header(headers)?;
    AccessToken::new(payload).map_err(|e| unauthorized(e.to_string()))
}
