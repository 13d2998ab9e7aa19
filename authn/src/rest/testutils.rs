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

//! Utilities to help testing the REST interface of the authentication service.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{AccessToken, User, UserId};
use crate::rest::app;
use axum::Router;
use iii_iv_core::clocks::Clock;
use iii_iv_core::db::DbError;

/// State of a running test.
pub(super) struct TestContext {
    /// The driver-level test context, which owns the database and the clock.
    inner: DriverTestContext,

    /// Instance of the app under test.
    app: Router,
}

impl TestContext {
    /// Initializes a REST app using an in-memory database and a settable clock.
    pub(super) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let app = app(inner.driver());
        Self { inner, app }
    }

    /// Gets the driver-level test context.
    pub(super) fn inner(&self) -> &DriverTestContext {
        &self.inner
    }

    /// Gets a clone of the app router.
    pub(super) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and transforms it into the app router.
    pub(super) fn into_app(self) -> Router {
        self.app
    }

    /// Checks if the user with `id` exists by directly querying the backing database.
    pub(super) async fn user_exists(&self, id: UserId) -> bool {
        match crate::db::get_user_by_id(&mut self.inner.ex().await, id).await {
            Ok(_) => true,
            Err(DbError::NotFound) => false,
            Err(e) => panic!("{:?}", e),
        }
    }

    /// Resolves `token` into the user it was issued for.
    pub(super) async fn get_session(&self, token: &AccessToken) -> User {
        let driver = self.inner.driver();
        let mut tx = self.inner.db().begin().await.unwrap();
        let now = self.inner.clock.now_utc();
        let user = driver.get_session(&mut tx, now, token.clone()).await.unwrap();
        tx.commit().await.unwrap();
        user
    }
}
