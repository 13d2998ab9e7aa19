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

//! REST interface for the authentication service.

use crate::driver::AuthnDriver;
use axum::Router;

mod api_login_post;
mod api_user_get;
mod api_users_post;
mod httputils;
#[cfg(test)]
mod testutils;

pub use api_login_post::{LoginRequest, LoginResponse};
pub use api_users_post::SignupRequest;
pub use httputils::get_bearer_auth;

/// Creates the router for the authentication endpoints.
///
/// The `driver` is a configured instance of the `AuthnDriver` to handle accounts and tokens.
pub fn app(driver: AuthnDriver) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/login/", post(api_login_post::handler))
        .route("/users/", post(api_users_post::handler))
        .route("/users/:id", get(api_user_get::handler))
        .with_state(driver)
}
