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

//! Database abstraction to manipulate posts and votes.

use crate::model::{Post, PostContent, PostId, PostWithVotes};
use iii_iv_authn::model::{PublicUser, UserId};
#[cfg(feature = "postgres")]
use iii_iv_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use iii_iv_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use iii_iv_core::db::{DbError, DbResult, Executor};
use iii_iv_core::model::EmailAddress;
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;


/// Columns to fetch from PostgreSQL to build a `Post`.  Requires joining `posts` with `users`.
#[cfg(feature = "postgres")]
const POSTGRES_POST_COLUMNS: &str = "
    posts.id, posts.title, posts.content, posts.published, posts.created_at, posts.owner_id,
    users.email AS owner_email, users.created_at AS owner_created_at";

/// Columns to fetch from SQLite to build a `Post`.  Requires joining `posts` with `users`.
#[cfg(any(feature = "sqlite", test))]
const SQLITE_POST_COLUMNS: &str = "
    posts.id, posts.title, posts.content, posts.published,
    posts.created_at_secs, posts.created_at_nsecs, posts.owner_id,
    users.email AS owner_email,
    users.created_at_secs AS owner_created_at_secs,
    users.created_at_nsecs AS owner_created_at_nsecs";

/// Initializes the database schema.
///
/// The schema of the authentication module must have been initialized first.
pub(crate) async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Post {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(postgres::map_sqlx_error)?;
        let content: String = row.try_get("content").map_err(postgres::map_sqlx_error)?;
        let published: bool = row.try_get("published").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let owner_id: i64 = row.try_get("owner_id").map_err(postgres::map_sqlx_error)?;
        let owner_email: String = row.try_get("owner_email").map_err(postgres::map_sqlx_error)?;
        let owner_created_at: OffsetDateTime =
            row.try_get("owner_created_at").map_err(postgres::map_sqlx_error)?;

        let owner = PublicUser {
            id: UserId::new(owner_id),
            email: EmailAddress::new(owner_email)?,
            created_at: owner_created_at,
        };
        Ok(Post::new(
            PostId::new(id),
            PostContent::new(title, content, published)?,
            created_at,
            owner,
        ))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for PostWithVotes {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let votes: i64 = row.try_get("votes").map_err(postgres::map_sqlx_error)?;
        let votes = u64::try_from(votes)
            .map_err(|e| DbError::DataIntegrityError(format!("Invalid vote count: {}", e)))?;
        Ok(PostWithVotes { post: Post::try_from(row)?, votes })
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Post {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
        let content: String = row.try_get("content").map_err(sqlite::map_sqlx_error)?;
        let published: bool = row.try_get("published").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let owner_id: i64 = row.try_get("owner_id").map_err(sqlite::map_sqlx_error)?;
        let owner_email: String = row.try_get("owner_email").map_err(sqlite::map_sqlx_error)?;
        let owner_created_at_secs: i64 =
            row.try_get("owner_created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let owner_created_at_nsecs: i64 =
            row.try_get("owner_created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let owner = PublicUser {
            id: UserId::new(owner_id),
            email: EmailAddress::new(owner_email)?,
            created_at: build_timestamp(owner_created_at_secs, owner_created_at_nsecs)?,
        };
        Ok(Post::new(
            PostId::new(id),
            PostContent::new(title, content, published)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            owner,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for PostWithVotes {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let votes: i64 = row.try_get("votes").map_err(sqlite::map_sqlx_error)?;
        let votes = u64::try_from(votes)
            .map_err(|e| DbError::DataIntegrityError(format!("Invalid vote count: {}", e)))?;
        Ok(PostWithVotes { post: Post::try_from(row)?, votes })
    }
}

/// Creates a new post with `content` owned by `owner`, recording `created_at` as its creation
/// time.  The identifier of the post is assigned by the database.
pub(crate) async fn create_post(
    ex: &mut Executor,
    content: PostContent,
    created_at: OffsetDateTime,
    owner: PublicUser,
) -> DbResult<Post> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO posts (title, content, published, created_at, owner_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(content.title().as_str())
                .bind(content.content().as_str())
                .bind(*content.published())
                .bind(created_at)
                .bind(owner.id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at)?;

            let query_str = "
                INSERT INTO posts
                    (title, content, published, created_at_secs, created_at_nsecs, owner_id)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(content.title().as_str())
                .bind(content.content().as_str())
                .bind(*content.published())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(owner.id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }
            done.last_insert_rowid()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Post::new(PostId::new(id), content, created_at, owner))
}

/// Gets the post identified by `id`.
pub(crate) async fn get_post(ex: &mut Executor, id: PostId) -> DbResult<Post> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT {} FROM posts JOIN users ON users.id = posts.owner_id WHERE posts.id = $1",
                POSTGRES_POST_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Post::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM posts JOIN users ON users.id = posts.owner_id WHERE posts.id = ?",
                SQLITE_POST_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Post::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the post identified by `id` along with its vote count.
pub(crate) async fn get_post_with_votes(
    ex: &mut Executor,
    id: PostId,
) -> DbResult<PostWithVotes> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "
                SELECT {}, COUNT(votes.post_id) AS votes
                FROM posts
                    JOIN users ON users.id = posts.owner_id
                    LEFT JOIN votes ON votes.post_id = posts.id
                WHERE posts.id = $1
                GROUP BY posts.id, users.id",
                POSTGRES_POST_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            PostWithVotes::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "
                SELECT {}, COUNT(votes.post_id) AS votes
                FROM posts
                    JOIN users ON users.id = posts.owner_id
                    LEFT JOIN votes ON votes.post_id = posts.id
                WHERE posts.id = ?
                GROUP BY posts.id, users.id",
                SQLITE_POST_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            PostWithVotes::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Lists posts along with their vote counts, ordered by identifier.
///
/// Only posts whose title contains `search` are returned.  The comparison ignores case for ASCII
/// letters only, identically on all backends.  Up to `limit` posts are returned after skipping the
/// first `skip` matches.
pub(crate) async fn list_posts(
    ex: &mut Executor,
    search: &str,
    limit: u16,
    skip: u32,
) -> DbResult<Vec<PostWithVotes>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "
                SELECT {}, COUNT(votes.post_id) AS votes
                FROM posts
                    JOIN users ON users.id = posts.owner_id
                    LEFT JOIN votes ON votes.post_id = posts.id
                WHERE STRPOS(LOWER(posts.title COLLATE \"C\"), LOWER($1 COLLATE \"C\")) > 0
                GROUP BY posts.id, users.id
                ORDER BY posts.id
                LIMIT $2 OFFSET $3",
                POSTGRES_POST_COLUMNS
            );
            let rows = sqlx::query(&query_str)
                .bind(search)
                .bind(i64::from(limit))
                .bind(i64::from(skip))
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(PostWithVotes::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "
                SELECT {}, COUNT(votes.post_id) AS votes
                FROM posts
                    JOIN users ON users.id = posts.owner_id
                    LEFT JOIN votes ON votes.post_id = posts.id
                WHERE INSTR(LOWER(posts.title), LOWER(?)) > 0
                GROUP BY posts.id, users.id
                ORDER BY posts.id
                LIMIT ? OFFSET ?",
                SQLITE_POST_COLUMNS
            );
            let rows = sqlx::query(&query_str)
                .bind(search)
                .bind(i64::from(limit))
                .bind(i64::from(skip))
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(PostWithVotes::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Replaces the user-editable fields of the post identified by `id` with `content`.
pub(crate) async fn update_post(
    ex: &mut Executor,
    id: PostId,
    content: &PostContent,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE posts SET title = $1, content = $2, published = $3
                WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(content.title().as_str())
                .bind(content.content().as_str())
                .bind(*content.published())
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE posts SET title = ?, content = ?, published = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(content.title().as_str())
                .bind(content.content().as_str())
                .bind(*content.published())
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the post identified by `id`, along with all of its votes.
pub(crate) async fn delete_post(ex: &mut Executor, id: PostId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM posts WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM posts WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

/// Records a vote by `user` on the post `post`.
///
/// Fails with `AlreadyExists` if the vote already exists and with `NotFound` if either the post or
/// the user do not exist.
pub(crate) async fn create_vote(ex: &mut Executor, post: PostId, user: UserId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO votes (post_id, user_id) VALUES ($1, $2)";
            let done = sqlx::query(query_str)
                .bind(post.as_i64())
                .bind(user.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO votes (post_id, user_id) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(post.as_i64())
                .bind(user.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Withdraws the vote by `user` on the post `post`.
pub(crate) async fn delete_vote(ex: &mut Executor, post: PostId, user: UserId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM votes WHERE post_id = $1 AND user_id = $2";
            let done = sqlx::query(query_str)
                .bind(post.as_i64())
                .bind(user.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM votes WHERE post_id = ? AND user_id = ?";
            let done = sqlx::query(query_str)
                .bind(post.as_i64())
                .bind(user.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
