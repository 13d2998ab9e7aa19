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

//! API to issue an access token for an existing user.

use crate::driver::{AuthnDriver, INVALID_CREDENTIALS_MESSAGE};
use crate::model::{AccessToken, Password};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};
use iii_iv_core::model::EmailAddress;
use iii_iv_core::rest::RestError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Form-encoded credentials sent to the server to log in.
#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    /// Email address of the user, which the form calls a username.
    pub username: String,

    /// Password of the user.
    pub password: String,
}

/// Message returned by the server after a successful login attempt.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    /// Access token for the user.
    pub access_token: AccessToken,

    /// Type of the token, which is always `bearer`.
    pub token_type: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    Form(request): Form<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let email = EmailAddress::new(request.username);
    let password = Password::new(request.password);
    let (email, password) = match (email, password) {
        (Ok(email), Ok(password)) => (email, password),
        (Err(e), _) | (_, Err(e)) => {
            debug!("Rejecting malformed credentials: {}", e);
            return Err(RestError::Forbidden(INVALID_CREDENTIALS_MESSAGE.to_owned()));
        }
    };

    let access_token = driver.login(email, password).await?;
    Ok(Json(LoginResponse { access_token, token_type: "bearer".to_owned() }))
}
