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

//! Utilities to help testing services that integrate with the `authn` features.

use crate::db;
use crate::driver::{AuthnDriver, AuthnOptions};
use crate::model::{AccessToken, Password, User};
use iii_iv_core::clocks::testutils::SettableClock;
use iii_iv_core::db::{Db, Executor};
use iii_iv_core::model::EmailAddress;
use std::sync::Arc;
use time::macros::datetime;

/// Secret used to sign tokens in tests.
pub const TEST_JWT_SECRET: &str = "test-secret";

/// State of a running test.
pub struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver, which tests can control.
    pub clock: Arc<SettableClock>,

    /// The driver to handle authentication flows.
    driver: AuthnDriver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub async fn setup() -> Self {
        Self::setup_with_opts(AuthnOptions::new(TEST_JWT_SECRET)).await
    }

    /// Initializes the driver using an in-memory database, a settable clock and custom `opts`.
    pub async fn setup_with_opts(opts: AuthnOptions) -> Self {
        let db = Arc::from(iii_iv_core::db::sqlite::testutils::setup().await);
        let clock = Arc::from(SettableClock::new(datetime!(2023-12-01 05:50:00 UTC)));
        Self::setup_with(db, clock, opts).await
    }

    /// Initializes the test context using the given already-initialized objects.
    ///
    /// This creates the schema needed by the authentication module in `db`.
    pub async fn setup_with(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<SettableClock>,
        opts: AuthnOptions,
    ) -> Self {
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = AuthnDriver::new(db.clone(), clock.clone(), opts);
        Self { db, clock, driver }
    }

    /// Syntactic sugar to create a user for testing purposes.
    pub async fn create_user(&self, email: &'static str, password: &'static str) -> User {
        self.driver
            .clone()
            .signup(EmailAddress::from(email), Password::from(password))
            .await
            .unwrap()
    }

    /// Syntactic sugar to log a user in for testing purposes.
    pub async fn do_test_login(&self, email: &'static str, password: &'static str) -> AccessToken {
        self.driver
            .clone()
            .login(EmailAddress::from(email), Password::from(password))
            .await
            .unwrap()
    }

    /// Gets access to the database used by this test context.
    pub fn db(&self) -> &(dyn Db + Send + Sync) {
        self.db.as_ref()
    }

    /// Gets a direct executor against the database.
    pub async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub fn driver(&self) -> AuthnDriver {
        self.driver.clone()
    }
}
