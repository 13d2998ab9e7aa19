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

//! Business logic for user authentication.

use crate::db;
use crate::model::{AccessToken, Claims, User};
use derivative::Derivative;
use iii_iv_core::clocks::Clock;
use iii_iv_core::db::{Db, DbError, TxExecutor};
use iii_iv_core::driver::{DriverError, DriverResult};
use iii_iv_core::env::{get_optional_var, get_required_var};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod login;
mod signup;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;
mod users;

pub(crate) use login::INVALID_CREDENTIALS_MESSAGE;

/// Default value for the `TOKEN_MAX_AGE` setting when not specified.
const DEFAULT_TOKEN_MAX_AGE_SECONDS: u64 = 30 * 60;

/// Message returned to the caller for any problem with its credentials.  Details are only logged
/// so that clients cannot probe for them.
const INVALID_TOKEN_MESSAGE: &str = "Could not validate credentials";

/// Parses the name of a JWT signing algorithm.  Only the symmetric HMAC variants are supported.
fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(format!("Unsupported JWT algorithm {}", name)),
    }
}

/// Configuration options for the authentication driver.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct AuthnOptions {
    /// Symmetric secret used to sign and verify access tokens.
    #[derivative(Debug = "ignore")]
    pub jwt_secret: String,

    /// Algorithm used to sign access tokens.
    pub jwt_algorithm: Algorithm,

    /// The amount of time access tokens are valid for after being issued.
    pub token_max_age: Duration,
}

impl AuthnOptions {
    /// Creates a new set of options with the given secret and defaults for everything else.
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_algorithm: Algorithm::HS256,
            token_max_age: Duration::from_secs(DEFAULT_TOKEN_MAX_AGE_SECONDS),
        }
    }

    /// Creates a new set of options from environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let jwt_algorithm = match get_optional_var::<String>(prefix, "JWT_ALGORITHM")? {
            Some(name) => parse_algorithm(&name).map_err(|e| {
                format!("Invalid value in environment variable {}_JWT_ALGORITHM: {}", prefix, e)
            })?,
            None => Algorithm::HS256,
        };
        Ok(Self {
            jwt_secret: get_required_var::<String>(prefix, "JWT_SECRET")?,
            jwt_algorithm,
            token_max_age: get_optional_var::<Duration>(prefix, "TOKEN_MAX_AGE")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TOKEN_MAX_AGE_SECONDS)),
        })
    }
}

/// Keys derived from the configured secret.
struct Keys {
    /// Key to sign new tokens with.
    encoding: EncodingKey,

    /// Key to verify incoming tokens with.
    decoding: DecodingKey,
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub struct AuthnDriver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for the authentication driver.
    opts: AuthnOptions,

    /// Signing and verification keys computed from `opts`.
    keys: Arc<Keys>,
}

impl AuthnDriver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: AuthnOptions,
    ) -> Self {
        let keys = Keys {
            encoding: EncodingKey::from_secret(opts.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(opts.jwt_secret.as_bytes()),
        };
        Self { db, clock, opts, keys: Arc::from(keys) }
    }

    /// Obtains the current time from the driver.
    #[cfg(test)]
    pub(crate) fn now_utc(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Issues a new signed access token for `user` valid from `now`.
    fn issue_token(&self, user: &User, now: OffsetDateTime) -> DriverResult<AccessToken> {
        let iat = now.unix_timestamp();
        let max_age = i64::try_from(self.opts.token_max_age.as_secs())
            .map_err(|e| DriverError::BackendError(format!("Invalid token max age: {}", e)))?;
        let claims = Claims { user_id: user.id(), iat, exp: iat.saturating_add(max_age) };

        let header = Header::new(self.opts.jwt_algorithm);
        let token = jsonwebtoken::encode(&header, &claims, &self.keys.encoding)
            .map_err(|e| DriverError::BackendError(format!("Cannot sign token: {}", e)))?;
        Ok(AccessToken::new(token)?)
    }

    /// Verifies the signature of `token` and that it has not expired at `now`, returning its
    /// claims.
    fn decode_token(&self, token: &AccessToken, now: OffsetDateTime) -> DriverResult<Claims> {
        let mut validation = Validation::new(self.opts.jwt_algorithm);
        // Expiration is checked against our own clock below.
        validation.validate_exp = false;

        let data =
            jsonwebtoken::decode::<Claims>(token.as_str(), &self.keys.decoding, &validation)
                .map_err(|e| {
                    debug!("Rejecting access token: {}", e);
                    DriverError::Unauthenticated(INVALID_TOKEN_MESSAGE.to_owned())
                })?;

        if data.claims.exp < now.unix_timestamp() {
            debug!("Rejecting access token for user {}: expired", data.claims.user_id);
            return Err(DriverError::Unauthenticated(INVALID_TOKEN_MESSAGE.to_owned()));
        }

        Ok(data.claims)
    }

    /// Decodes the session in `token`, validates it and returns the user that owns the session.
    ///
    /// This runs within the caller's transaction `tx` so that services can resolve the caller as
    /// part of their own operations.
    pub async fn get_session(
        &self,
        tx: &mut TxExecutor,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<User> {
        let claims = self.decode_token(&token, now)?;

        match db::get_user_by_id(tx.ex(), claims.user_id).await {
            Ok(user) => Ok(user),
            Err(DbError::NotFound) => {
                debug!("Rejecting access token for unknown user {}", claims.user_id);
                Err(DriverError::Unauthenticated(INVALID_TOKEN_MESSAGE.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;

    #[test]
    pub fn test_options_from_env_required_only() {
        temp_env::with_vars(
            [
                ("PREFIX_JWT_SECRET", Some("the-secret")),
                ("PREFIX_JWT_ALGORITHM", None),
                ("PREFIX_TOKEN_MAX_AGE", None),
            ],
            || {
                let opts = AuthnOptions::from_env("PREFIX").unwrap();
                assert_eq!(AuthnOptions::new("the-secret"), opts);
            },
        );
    }

    #[test]
    pub fn test_options_from_env_all_present() {
        temp_env::with_vars(
            [
                ("PREFIX_JWT_SECRET", Some("the-secret")),
                ("PREFIX_JWT_ALGORITHM", Some("HS512")),
                ("PREFIX_TOKEN_MAX_AGE", Some("40m")),
            ],
            || {
                let opts = AuthnOptions::from_env("PREFIX").unwrap();
                assert_eq!(
                    AuthnOptions {
                        jwt_secret: "the-secret".to_owned(),
                        jwt_algorithm: Algorithm::HS512,
                        token_max_age: Duration::from_secs(40 * 60),
                    },
                    opts
                );
            },
        );
    }

    #[test]
    pub fn test_options_from_env_missing_secret() {
        temp_env::with_var_unset("NOSECRET_JWT_SECRET", || {
            let err = AuthnOptions::from_env("NOSECRET").unwrap_err();
            assert!(err.contains("NOSECRET_JWT_SECRET not present"));
        });
    }

    #[test]
    pub fn test_options_from_env_bad_algorithm() {
        temp_env::with_vars(
            [("BADALG_JWT_SECRET", Some("the-secret")), ("BADALG_JWT_ALGORITHM", Some("RS256"))],
            || {
                let err = AuthnOptions::from_env("BADALG").unwrap_err();
                assert!(err.contains("BADALG_JWT_ALGORITHM"));
                assert!(err.contains("Unsupported JWT algorithm RS256"));
            },
        );
    }

    #[test]
    pub fn test_options_debug_hides_secret() {
        let opts = AuthnOptions::new("super-secret-value");
        assert!(!format!("{:?}", opts).contains("super-secret-value"));
    }

    #[tokio::test]
    async fn test_get_session_ok() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        let token = context.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let mut tx = context.db().begin().await.unwrap();
        let session_user =
            context.driver().get_session(&mut tx, context.clock.now_utc(), token).await.unwrap();
        assert_eq!(user, session_user);
    }

    #[tokio::test]
    async fn test_get_session_token_names_user() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        let token = context.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let claims = context.driver().decode_token(&token, context.clock.now_utc()).unwrap();
        assert_eq!(user.id(), claims.user_id);
        assert_eq!(context.clock.now_utc().unix_timestamp(), claims.iat);
        assert_eq!(claims.iat + 30 * 60, claims.exp);
    }

    #[tokio::test]
    async fn test_get_session_expired() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        let token = context.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let mut tx = context.db().begin().await.unwrap();

        for delta in [0, 60, 30 * 60] {
            let now = context.clock.now_utc() + Duration::from_secs(delta);
            context.driver().get_session(&mut tx, now, token.clone()).await.unwrap();
        }

        for delta in [30 * 60 + 1, 24 * 3600] {
            let now = context.clock.now_utc() + Duration::from_secs(delta);
            match context.driver().get_session(&mut tx, now, token.clone()).await {
                Err(DriverError::Unauthenticated(msg)) => {
                    assert_eq!(INVALID_TOKEN_MESSAGE, msg)
                }
                e => panic!("{:?}", e),
            }
        }
    }

    #[tokio::test]
    async fn test_get_session_tampered() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        let token = context.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let mut raw = token.as_str().to_owned();
        let last = raw.pop().unwrap();
        raw.push(if last == 'A' { 'B' } else { 'A' });
        let tampered = AccessToken::new(raw).unwrap();

        let mut tx = context.db().begin().await.unwrap();
        match context.driver().get_session(&mut tx, context.clock.now_utc(), tampered).await {
            Err(DriverError::Unauthenticated(msg)) => assert_eq!(INVALID_TOKEN_MESSAGE, msg),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_session_other_secret() {
        let context = TestContext::setup().await;
        let other = TestContext::setup_with_opts(AuthnOptions::new("some other secret")).await;

        let user = other.create_user("a@example.com", "password1").await;
        let token = other.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let mut tx = context.db().begin().await.unwrap();
        match context.driver().get_session(&mut tx, context.clock.now_utc(), token).await {
            Err(DriverError::Unauthenticated(msg)) => assert_eq!(INVALID_TOKEN_MESSAGE, msg),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_session_garbage() {
        let context = TestContext::setup().await;

        let mut tx = context.db().begin().await.unwrap();
        let token = AccessToken::new("not.a.jwt").unwrap();
        match context.driver().get_session(&mut tx, context.clock.now_utc(), token).await {
            Err(DriverError::Unauthenticated(msg)) => assert_eq!(INVALID_TOKEN_MESSAGE, msg),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_session_unknown_user() {
        let context = TestContext::setup().await;

        let user = context.create_user("a@example.com", "password1").await;
        let token = context.driver().login(user.email().clone(), "password1".into()).await.unwrap();

        let other = TestContext::setup().await;
        let mut tx = other.db().begin().await.unwrap();
        match other.driver().get_session(&mut tx, other.clock.now_utc(), token).await {
            Err(DriverError::Unauthenticated(msg)) => assert_eq!(INVALID_TOKEN_MESSAGE, msg),
            e => panic!("{:?}", e),
        }
    }
}
