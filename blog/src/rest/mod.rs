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

//! REST interface for the blogging service.

use crate::driver::Driver;
use crate::model::PostContent;
use axum::Router;
use iii_iv_core::model::ModelResult;
use serde::{Deserialize, Serialize};

mod post_delete;
mod post_get;
mod post_put;
mod posts_get;
mod posts_post;
#[cfg(test)]
mod testutils;
mod vote_post;

/// Message sent to the server to create or replace a post.
#[derive(Deserialize, Serialize)]
pub(crate) struct PostRequest {
    /// Title of the post.
    pub(crate) title: String,

    /// Body of the post.
    pub(crate) content: String,

    /// Whether the post is visible to others.  Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) published: Option<bool>,
}

impl PostRequest {
    /// Validates the request and converts it into the contents of a post.
    fn into_content(self) -> ModelResult<PostContent> {
        PostContent::new(self.title, self.content, self.published.unwrap_or(true))
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/posts/", get(posts_get::handler).post(posts_post::handler))
        .route(
            "/posts/:id",
            get(post_get::handler).put(post_put::handler).delete(post_delete::handler),
        )
        .route("/vote/", post(vote_post::handler))
        .with_state(driver)
}
