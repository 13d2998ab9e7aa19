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

//! Extends the driver with the `signup` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{Password, User, password_validator};
use iii_iv_core::db::DbError;
use iii_iv_core::driver::{DriverError, DriverResult};
use iii_iv_core::model::EmailAddress;
use log::info;

impl AuthnDriver {
    /// Creates a new account for `email` protected by `password`.
    pub(crate) async fn signup(self, email: EmailAddress, password: Password) -> DriverResult<User> {
        let password = password.validate_and_hash(password_validator)?;

        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let user = match db::create_user(tx.ex(), email.clone(), password, now).await {
            Ok(user) => user,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(format!(
                    "User with email: {} already exists",
                    email.as_str()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        info!("Created user {}", user.id());
        Ok(user)
    }
}
