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

//! Extends the driver with the `login` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password};
use iii_iv_core::db::DbError;
use iii_iv_core::driver::{DriverError, DriverResult};
use iii_iv_core::model::EmailAddress;
use log::debug;

/// Message returned for any login failure.  Unknown users and bad passwords are not
/// distinguished.
pub(crate) const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

impl AuthnDriver {
    /// Logs a user with `email` and `password` in and returns a new access token for them.
    pub(crate) async fn login(
        self,
        email: EmailAddress,
        password: Password,
    ) -> DriverResult<AccessToken> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let user = match db::get_user_by_email(tx.ex(), &email).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                debug!("Login attempt for unknown user {}", email.as_str());
                return Err(DriverError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        if !password.verify(user.password())? {
            debug!("Login attempt with bad password for user {}", user.id());
            return Err(DriverError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_owned()));
        }

        let token = self.issue_token(&user, now)?;

        tx.commit().await?;
        Ok(token)
    }
}
