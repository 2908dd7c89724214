// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cognito user pool group listing (`AdminListGroupsForUser`).
//!
//! Calls the JSON 1.1 API directly with SigV4-signed requests, following
//! `NextToken` until every page has been read.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::error::GroupLookupError;
use super::groups::GroupDirectory;
use super::sigv4::{sign_post, Scope};
use crate::clock::Clock;

const SERVICE: &str = "cognito-idp";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const LIST_GROUPS_TARGET: &str = "AWSCognitoIdentityProviderService.AdminListGroupsForUser";

/// Upper bound on pages read for a single user.
const MAX_PAGES: usize = 10;

/// Static AWS credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListGroupsRequest<'a> {
    user_pool_id: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListGroupsResponse {
    #[serde(default)]
    groups: Vec<GroupType>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupType {
    group_name: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Group directory backed by the Cognito user pool API.
pub struct CognitoGroupDirectory {
    endpoint: Url,
    region: String,
    credentials: AwsCredentials,
    client: reqwest::Client,
    clock: std::sync::Arc<dyn Clock>,
}

impl CognitoGroupDirectory {
    /// Directory for the regional endpoint `https://cognito-idp.<region>.amazonaws.com/`.
    pub fn new(
        region: impl Into<String>,
        credentials: AwsCredentials,
        timeout: Duration,
        clock: std::sync::Arc<dyn Clock>,
    ) -> Result<Self, GroupLookupError> {
        let region = region.into();
        let endpoint = Url::parse(&format!("https://{SERVICE}.{region}.amazonaws.com/"))
            .map_err(|e| GroupLookupError::NotConfigured(e.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            region,
            credentials,
            client,
            clock,
        })
    }

    /// Override the endpoint (VPC endpoints, local testing).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn host(&self) -> Result<String, GroupLookupError> {
        let host = self
            .endpoint
            .host_str()
            .ok_or_else(|| GroupLookupError::NotConfigured("endpoint has no host".into()))?;
        Ok(match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    async fn list_page(
        &self,
        request: &ListGroupsRequest<'_>,
    ) -> Result<ListGroupsResponse, GroupLookupError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| GroupLookupError::InvalidResponse(e.to_string()))?;

        let signed = sign_post(
            &self.credentials,
            Scope {
                region: &self.region,
                service: SERVICE,
            },
            &self.host()?,
            &[("content-type", CONTENT_TYPE), ("x-amz-target", LIST_GROUPS_TARGET)],
            &body,
            self.clock.now(),
        )
        .map_err(|e| GroupLookupError::Signing(e.to_string()))?;

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", LIST_GROUPS_TARGET)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            builder = builder.header("x-amz-security-token", token);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.error_type.unwrap_or_else(|| "UnknownError".to_string()),
                        e.message.unwrap_or_default()
                    )
                })
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(GroupLookupError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| GroupLookupError::InvalidResponse(e.to_string()))
    }
}

impl GroupDirectory for CognitoGroupDirectory {
    fn list_groups<'a>(
        &'a self,
        user_pool_id: &'a str,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, GroupLookupError>> {
        Box::pin(async move {
            let mut groups = Vec::new();
            let mut next_token: Option<String> = None;

            for _ in 0..MAX_PAGES {
                let page = self
                    .list_page(&ListGroupsRequest {
                        user_pool_id,
                        username,
                        next_token: next_token.as_deref(),
                    })
                    .await?;
                groups.extend(page.groups.into_iter().map(|g| g.group_name));

                match page.next_token {
                    Some(token) if !token.is_empty() => next_token = Some(token),
                    _ => return Ok(groups),
                }
            }

            debug!(username, pages = MAX_PAGES, "Stopped paging user groups");
            Ok(groups)
        })
    }
}
