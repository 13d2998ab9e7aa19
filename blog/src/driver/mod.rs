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

//! Business logic for the blogging service.

use iii_iv_authn::driver::AuthnDriver;
use iii_iv_authn::model::{AccessToken, User};
use iii_iv_core::clocks::Clock;
use iii_iv_core::db::{Db, TxExecutor};
use iii_iv_core::driver::DriverResult;
use std::sync::Arc;

mod post;
mod posts;
#[cfg(test)]
pub(crate) mod testutils;
mod vote;

pub(crate) use posts::DEFAULT_LIMIT;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// The authentication driver used to resolve access tokens into users.
    authn: AuthnDriver,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        authn: AuthnDriver,
    ) -> Self {
        Self { db, clock, authn }
    }

    /// Resolves `token` into the user that is issuing the request, within the transaction `tx`.
    async fn authenticate(&self, tx: &mut TxExecutor, token: AccessToken) -> DriverResult<User> {
        self.authn.get_session(tx, self.clock.now_utc(), token).await
    }
}
