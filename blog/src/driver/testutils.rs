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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::{Post, PostContent};
use iii_iv_authn::driver::AuthnOptions;
use iii_iv_authn::driver::testutils::{TEST_JWT_SECRET, TestContext as AuthnTestContext};
use iii_iv_authn::model::{AccessToken, User};
use iii_iv_core::clocks::Clock;
use iii_iv_core::clocks::testutils::SettableClock;
use iii_iv_core::db::{Db, Executor};
use std::sync::Arc;
use time::macros::datetime;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver, which tests can control.
    pub(crate) clock: Arc<SettableClock>,

    /// Test context of the authentication module, used to create users and tokens.
    authn: AuthnTestContext,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let db = Arc::from(iii_iv_core::db::sqlite::testutils::setup().await);
        let clock = Arc::from(SettableClock::new(datetime!(2023-12-01 05:50:00 UTC)));

        let opts = AuthnOptions::new(TEST_JWT_SECRET);
        let authn = AuthnTestContext::setup_with(db.clone(), clock.clone(), opts).await;
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let driver = Driver::new(db.clone(), clock.clone(), authn.driver());
        Self { db, clock, authn, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a user with `email` and logs them in, returning the user and its access token.
    pub(crate) async fn login(&self, email: &'static str) -> (User, AccessToken) {
        let user = self.authn.create_user(email, "password1").await;
        let token = self.authn.do_test_login(email, "password1").await;
        (user, token)
    }

    /// Creates a post titled `title` owned by `owner` directly in the database.
    pub(crate) async fn create_post(&self, owner: &User, title: &str) -> Post {
        let content = PostContent::new(title, format!("Content of {}", title), true).unwrap();
        db::create_post(&mut self.ex().await, content, self.clock.now_utc(), owner.public())
            .await
            .unwrap()
    }
}
