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

//! API to list posts.

use crate::driver::{DEFAULT_LIMIT, Driver};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use http::HeaderMap;
use iii_iv_authn::rest::get_bearer_auth;
use iii_iv_core::rest::{EmptyBody, RestError};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct ListPostsQuery {
    /// Only return posts whose title contains this string, ignoring the case of ASCII letters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) search: Option<String>,

    /// Maximum number of posts to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u32>,

    /// Number of matching posts to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) skip: Option<u32>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;
    let Query(query) = query?;

    let posts = driver
        .list_posts(
            token,
            query.search.as_deref().unwrap_or(""),
            query.limit.unwrap_or(DEFAULT_LIMIT),
            query.skip.unwrap_or(0),
        )
        .await?;
    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PostWithVotes;
    use crate::rest::testutils::*;
    use iii_iv_core::rest::testutils::OneShotBuilder;
    use iii_iv_core::test_payload_must_be_empty;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/posts/".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let (user1, token) = context.login("a@example.com").await;
        let (user2, _) = context.login("b@example.com").await;
        let post1 = context.create_post(&user1, "First").await;
        let post2 = context.create_post(&user2, "Second").await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Vec<PostWithVotes>>()
            .await;
        assert_eq!(
            vec![
                PostWithVotes { post: post1, votes: 0 },
                PostWithVotes { post: post2, votes: 0 },
            ],
            response
        );
    }

    #[tokio::test]
    async fn test_json_shape() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;
        context.create_post(&user, "First").await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        let entry = &response.as_array().unwrap()[0];
        assert_eq!(0, entry["votes"]);
        assert_eq!("First", entry["Post"]["title"]);
        assert_eq!(true, entry["Post"]["published"]);
        assert_eq!(user.id().as_i64(), entry["Post"]["owner_id"]);
        assert_eq!("a@example.com", entry["Post"]["owner"]["email"]);
        assert!(entry["Post"]["owner"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_query() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;
        let mut posts = vec![];
        for title in ["Rust 1", "Go", "rust 2", "RUST 3", "rust 4"] {
            posts.push(context.create_post(&user, title).await);
        }

        let query = ListPostsQuery {
            search: Some("RuSt".to_owned()),
            limit: Some(2),
            skip: Some(1),
        };
        let response = OneShotBuilder::new(context.app(), route())
            .with_query(query)
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Vec<PostWithVotes>>()
            .await;
        assert_eq!(
            vec![
                PostWithVotes { post: posts[2].clone(), votes: 0 },
                PostWithVotes { post: posts[3].clone(), votes: 0 },
            ],
            response
        );
    }

    #[tokio::test]
    async fn test_default_limit() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;
        for i in 0..12 {
            context.create_post(&user, &format!("Post {}", i)).await;
        }

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Vec<PostWithVotes>>()
            .await;
        assert_eq!(10, response.len());
    }

    #[tokio::test]
    async fn test_limit_too_large() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        let query = ListPostsQuery { limit: Some(101), ..Default::default() };
        OneShotBuilder::new(context.app(), route())
            .with_query(query)
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            .expect_error("Limit cannot be larger than 100")
            .await;
    }

    #[tokio::test]
    async fn test_search_too_long() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        let query = ListPostsQuery { search: Some("a".repeat(51)), ..Default::default() };
        OneShotBuilder::new(context.app(), route())
            .with_query(query)
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            .expect_error("Search cannot be longer than 50 characters")
            .await;
    }

    #[tokio::test]
    async fn test_bad_query() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        for uri in ["/posts/?limit=abc", "/posts/?limit=-1", "/posts/?skip=-1"] {
            OneShotBuilder::new(context.app(), (http::Method::GET, uri))
                .with_bearer_auth(token.as_str())
                .send_empty()
                .await
                .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
                .expect_error("Failed to deserialize query string")
                .await;
        }
    }

    #[tokio::test]
    async fn test_no_auth() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .take_response()
            .await;
        assert_eq!("Bearer", response.headers().get(http::header::WWW_AUTHENTICATE).unwrap());
    }

    #[tokio::test]
    async fn test_expired_token() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        context.inner().clock.advance(std::time::Duration::from_secs(30 * 60 + 1));
        OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Could not validate credentials")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
