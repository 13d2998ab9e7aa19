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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{Post, PostId};
use crate::rest::app;
use axum::Router;
use iii_iv_authn::model::{AccessToken, User};
use iii_iv_core::db::DbError;

/// State of a running test.
pub(crate) struct TestContext {
    /// The driver-level test context, which owns the database and the clock.
    inner: DriverTestContext,

    /// Instance of the app under test.
    app: Router,
}

impl TestContext {
    /// Initializes a REST app using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let app = app(inner.driver());
        Self { inner, app }
    }

    /// Gets the driver-level test context.
    pub(crate) fn inner(&self) -> &DriverTestContext {
        &self.inner
    }

    /// Gets a clone of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and transforms it into the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a user with `email` and logs them in, returning the user and its access token.
    pub(crate) async fn login(&self, email: &'static str) -> (User, AccessToken) {
        self.inner.login(email).await
    }

    /// Creates a post titled `title` owned by `owner` directly in the database.
    pub(crate) async fn create_post(&self, owner: &User, title: &str) -> Post {
        self.inner.create_post(owner, title).await
    }

    /// Gets the post `id` by directly querying the database, if it exists.
    pub(crate) async fn get_post(&self, id: PostId) -> Option<Post> {
        match crate::db::get_post(&mut self.inner.ex().await, id).await {
            Ok(post) => Some(post),
            Err(DbError::NotFound) => None,
            Err(e) => panic!("{:?}", e),
        }
    }

    /// Gets the number of votes of the post `id` by directly querying the database.
    pub(crate) async fn count_votes(&self, id: PostId) -> u64 {
        crate::db::get_post_with_votes(&mut self.inner.ex().await, id).await.unwrap().votes
    }
}
