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

//! API to replace the contents of a post.

use crate::driver::Driver;
use crate::model::PostId;
use crate::rest::PostRequest;
use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use http::HeaderMap;
use iii_iv_authn::rest::get_bearer_auth;
use iii_iv_core::rest::RestError;

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    id: Result<Path<PostId>, PathRejection>,
    headers: HeaderMap,
    Json(request): Json<PostRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;
    let Path(id) = id?;
    let content = request.into_content()?;

    let post = driver.update_post(token, id, content).await?;
    Ok(Json(post))
}
