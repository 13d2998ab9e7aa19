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

//! Operations on a single post.

use crate::db;
use crate::driver::Driver;
use crate::model::{Post, PostContent, PostId, PostWithVotes};
use iii_iv_authn::model::{AccessToken, User};
use iii_iv_core::db::{DbError, TxExecutor};
use iii_iv_core::driver::{DriverError, DriverResult};
use log::debug;

/// Constructs the error returned when the post `id` does not exist.
fn post_not_found(id: PostId) -> DriverError {
    DriverError::NotFound(format!("Post with id: {} was not found", id))
}

/// Fetches the post `id` and ensures that `user` owns it.
///
/// Existence is checked before ownership so that callers can tell apart missing posts from posts
/// they cannot touch.
async fn get_owned_post(tx: &mut TxExecutor, id: PostId, user: &User) -> DriverResult<Post> {
    let post = match db::get_post(tx.ex(), id).await {
        Ok(post) => post,
        Err(DbError::NotFound) => return Err(post_not_found(id)),
        Err(e) => return Err(e.into()),
    };

    if !post.is_owned_by(user.id()) {
        debug!("User {} attempted to modify post {} owned by {}", user.id(), id, post.owner_id());
        return Err(DriverError::Unauthorized(
            "Not authorized to perform requested action".to_owned(),
        ));
    }

    Ok(post)
}

impl Driver {
    /// Gets the post `id` along with its vote count.
    pub(crate) async fn get_post(
        self,
        token: AccessToken,
        id: PostId,
    ) -> DriverResult<PostWithVotes> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let post = match db::get_post_with_votes(tx.ex(), id).await {
            Ok(post) => post,
            Err(DbError::NotFound) => return Err(post_not_found(id)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(post)
    }

    /// Replaces the contents of the post `id` with `content`.  Only the owner can do this.
    pub(crate) async fn update_post(
        self,
        token: AccessToken,
        id: PostId,
        content: PostContent,
    ) -> DriverResult<Post> {
        let mut tx = self.db.begin().await?;
        let user = self.authenticate(&mut tx, token).await?;

        let post = get_owned_post(&mut tx, id, &user).await?;
        db::update_post(tx.ex(), id, &content).await?;
        tx.commit().await?;

        Ok(Post::new(id, content, *post.created_at(), post.owner().clone()))
    }

    /// Deletes the post `id` and all of its votes.  Only the owner can do this.
    pub(crate) async fn delete_post(self, token: AccessToken, id: PostId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let user = self.authenticate(&mut tx, token).await?;

        get_owned_post(&mut tx, id, &user).await?;
        db::delete_post(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    /// Asserts that `result` is a failure due to the caller not owning the post.
    fn assert_forbidden<T: std::fmt::Debug>(result: DriverResult<T>) {
        assert_eq!(
            DriverError::Unauthorized("Not authorized to perform requested action".to_owned()),
            result.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_post_ok() {
        let context = TestContext::setup().await;
        let (user1, token) = context.login("a@example.com").await;
        let (user2, _) = context.login("b@example.com").await;

        let post = context.create_post(&user2, "Someone else's").await;
        db::create_vote(&mut context.ex().await, *post.id(), user1.id()).await.unwrap();
        db::create_vote(&mut context.ex().await, *post.id(), user2.id()).await.unwrap();

        let result = context.driver().get_post(token, *post.id()).await.unwrap();
        assert_eq!(PostWithVotes { post, votes: 2 }, result);
    }

    #[tokio::test]
    async fn test_get_post_picks_requested_one() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;

        context.create_post(&user, "First").await;
        let post = context.create_post(&user, "Second").await;

        let result = context.driver().get_post(token, *post.id()).await.unwrap();
        assert_eq!(PostWithVotes { post, votes: 0 }, result);
    }

    #[tokio::test]
    async fn test_get_post_not_found() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        assert_eq!(
            DriverError::NotFound("Post with id: 5 was not found".to_owned()),
            context.driver().get_post(token, PostId::new(5)).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_post_ok() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;
        let post = context.create_post(&user, "Original").await;

        let content = PostContent::new("Updated", "New body", false).unwrap();
        let updated =
            context.driver().update_post(token, *post.id(), content.clone()).await.unwrap();

        let exp_post = Post::new(*post.id(), content, *post.created_at(), user.public());
        assert_eq!(exp_post, updated);
        assert_eq!(exp_post, db::get_post(&mut context.ex().await, *post.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_post_not_found() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        let content = PostContent::new("Updated", "New body", false).unwrap();
        assert_eq!(
            DriverError::NotFound("Post with id: 8 was not found".to_owned()),
            context.driver().update_post(token, PostId::new(8), content).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_post_not_owner() {
        let context = TestContext::setup().await;
        let (user1, _) = context.login("a@example.com").await;
        let (_, token2) = context.login("b@example.com").await;
        let post = context.create_post(&user1, "Original").await;

        let content = PostContent::new("Hijacked", "New body", true).unwrap();
        assert_forbidden(context.driver().update_post(token2, *post.id(), content).await);

        assert_eq!(post, db::get_post(&mut context.ex().await, *post.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_post_ok() {
        let context = TestContext::setup().await;
        let (user, token) = context.login("a@example.com").await;
        let post = context.create_post(&user, "Doomed").await;
        let other = context.create_post(&user, "Survivor").await;
        db::create_vote(&mut context.ex().await, *post.id(), user.id()).await.unwrap();

        context.driver().delete_post(token, *post.id()).await.unwrap();

        assert_eq!(
            DbError::NotFound,
            db::get_post(&mut context.ex().await, *post.id()).await.unwrap_err()
        );
        assert_eq!(other, db::get_post(&mut context.ex().await, *other.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_post_not_found() {
        let context = TestContext::setup().await;
        let (_, token) = context.login("a@example.com").await;

        assert_eq!(
            DriverError::NotFound("Post with id: 3 was not found".to_owned()),
            context.driver().delete_post(token, PostId::new(3)).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_post_not_owner() {
        let context = TestContext::setup().await;
        let (user1, _) = context.login("a@example.com").await;
        let (_, token2) = context.login("b@example.com").await;
        let post = context.create_post(&user1, "Mine").await;

        assert_forbidden(context.driver().delete_post(token2, *post.id()).await);

        db::get_post(&mut context.ex().await, *post.id()).await.unwrap();
    }
}
