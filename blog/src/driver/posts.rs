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

//! Operations on the collection of posts.

use crate::db;
use crate::driver::Driver;
use crate::model::{Post, PostContent, PostWithVotes};
use iii_iv_authn::model::AccessToken;
use iii_iv_core::driver::{DriverError, DriverResult};
use log::info;

/// Number of posts returned by a listing when the caller does not ask for a specific amount.
pub(crate) const DEFAULT_LIMIT: u32 = 10;

/// Maximum number of posts that a single listing can return.
pub(crate) const MAX_LIMIT: u32 = 100;

/// Maximum length of the title filter of a listing, in characters.
const MAX_SEARCH_LENGTH: usize = 50;

impl Driver {
    /// Lists up to `limit` posts whose title contains `search`, skipping the first `skip` ones.
    pub(crate) async fn list_posts(
        self,
        token: AccessToken,
        search: &str,
        limit: u32,
        skip: u32,
    ) -> DriverResult<Vec<PostWithVotes>> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let limit = match u16::try_from(limit) {
            Ok(limit) if u32::from(limit) <= MAX_LIMIT => limit,
            _ => {
                return Err(DriverError::InvalidInput(format!(
                    "Limit cannot be larger than {}",
                    MAX_LIMIT
                )));
            }
        };
        if search.chars().count() > MAX_SEARCH_LENGTH {
            return Err(DriverError::InvalidInput(format!(
                "Search cannot be longer than {} characters",
                MAX_SEARCH_LENGTH
            )));
        }

        let posts = db::list_posts(tx.ex(), search, limit, skip).await?;
        tx.commit().await?;
        Ok(posts)
    }

    /// Creates a new post with `content` owned by the caller.
    pub(crate) async fn create_post(
        self,
        token: AccessToken,
        content: PostContent,
    ) -> DriverResult<Post> {
        let mut tx = self.db.begin().await?;
        let user = self.authenticate(&mut tx, token).await?;

        let now = self.clock.now_utc();
        let post = db::create_post(tx.ex(), content, now, user.public()).await?;
        tx.commit().await?;
        info!("User {} created post {}", user.id(), post.id());
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use iii_iv_core::clocks::Clock;
    use std::time::Duration;

    #[tokio::test]
    async fn test_list_posts_ok() {
        let context = TestContext::setup().await;
        let (user1, token) = context.login("a@example.com").await;
        let (user2, _) = context.login("b@example.com").await;

        let post1 = context.create_post(&user1, "First").await;
        let post2 = context.create_post(&user2, "Second").await;
        db::create_vote(&mut context.ex().await, *post2.id(), user1.id()).await.unwrap();

        let posts = context.driver().list_posts(token, "", DEFAULT_LIMIT, 0).await.unwrap();
        assert_eq!(
            vec![
                PostWithVotes { post: post1, votes: 0 },
                PostWithVotes { post: post2, votes: 1 },
            ],
            posts
        );
    }

    #[tokio::test]
    async fn test_list_posts_search_and_paging() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;

        let mut posts = vec![];
        for title in ["Hello world", "Goodbye", "hello again", "HELLO there"] {
            posts.push(context.create_post(&user, title).await);
        }

        let found = context.driver().list_posts(token.clone(), "Hello", 2, 1).await.unwrap();
        assert_eq!(
            vec![
                PostWithVotes { post: posts[2].clone(), votes: 0 },
                PostWithVotes { post: posts[3].clone(), votes: 0 },
            ],
            found
        );

        let found = context.driver().list_posts(token, "", 0, 0).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_list_posts_limit_too_large() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        context.driver().list_posts(token.clone(), "", MAX_LIMIT, 0).await.unwrap();
        for limit in [MAX_LIMIT + 1, u32::MAX] {
            assert_eq!(
                DriverError::InvalidInput("Limit cannot be larger than 100".to_owned()),
                context.driver().list_posts(token.clone(), "", limit, 0).await.unwrap_err()
            );
        }
    }

    #[tokio::test]
    async fn test_list_posts_search_too_long() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        let search = "x".repeat(MAX_SEARCH_LENGTH);
        context.driver().list_posts(token.clone(), &search, 10, 0).await.unwrap();

        let search = "x".repeat(MAX_SEARCH_LENGTH + 1);
        assert_eq!(
            DriverError::InvalidInput("Search cannot be longer than 50 characters".to_owned()),
            context.driver().list_posts(token, &search, 10, 0).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_list_posts_expired_token() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        context.clock.advance(Duration::from_secs(31 * 60));
        match context.driver().list_posts(token, "", 10, 0).await {
            Err(DriverError::Unauthenticated(msg)) => {
                assert_eq!("Could not validate credentials", msg)
            }
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_create_post_ok() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;

        let content = PostContent::new("Title", "Body", false).unwrap();
        let post = context.driver().create_post(token, content).await.unwrap();
        assert_eq!("Title", post.title());
        assert_eq!("Body", post.content());
        assert!(!*post.published());
        assert_eq!(context.clock.now_utc(), *post.created_at());
        assert_eq!(&user.public(), post.owner());

        assert_eq!(post, db::get_post(&mut context.ex().await, *post.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_post_bad_token() {
        let context = TestContext::setup().await;

        let token = AccessToken::new("not.a.token").unwrap();
        let content = PostContent::new("Title", "Body", true).unwrap();
        match context.driver().create_post(token, content).await {
            Err(DriverError::Unauthenticated(_)) => (),
            e => panic!("{:?}", e),
        }
        assert!(db::list_posts(&mut context.ex().await, "", 10, 0).await.unwrap().is_empty());
    }
}
