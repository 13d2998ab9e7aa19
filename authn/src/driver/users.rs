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

//! Extends the driver with the `get_user` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{User, UserId};
use iii_iv_core::db::DbError;
use iii_iv_core::driver::{DriverError, DriverResult};

impl AuthnDriver {
    /// Gets the details of the user identified by `id`.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<User> {
        let mut tx = self.db.begin().await?;

        let user = match db::get_user_by_id(tx.ex(), id).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!("User with id: {} does not exist", id)));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_get_user_ok() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        assert_eq!(user, context.driver().get_user(user.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let context = TestContext::setup().await;

        match context.driver().get_user(UserId::new(8)).await {
            Err(DriverError::NotFound(msg)) => assert_eq!("User with id: 8 does not exist", msg),
            e => panic!("{:?}", e),
        }
    }
}
