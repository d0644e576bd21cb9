use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::user::User;

/// Protocol version echoed when a request does not carry one.
pub const VERSION: &str = "0.0.1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "RequestParams::is_empty"
    )]
    pub params: RequestParams,
}

/// `"params": null` reads the same as an absent block.
fn null_as_default<'de, D>(deserializer: D) -> std::result::Result<RequestParams, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RequestParams>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apikey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<JsonValue>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RequestParams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    pub fn apikey(&self) -> Option<&str> {
        non_empty(&self.apikey)
    }
}

impl Request {
    pub fn new(method: impl Into<String>, params: RequestParams) -> Self {
        Self {
            method: method.into(),
            params,
            ..Self::default()
        }
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

#[derive(Deserialize)]
struct MethodOnly {
    #[serde(default)]
    method: String,
}

/// Reads the method name without validating the rest of the request, so a
/// transport can apply the method policy before dispatching.
pub fn peek_method(data: &str) -> Option<String> {
    serde_json::from_str::<MethodOnly>(data)
        .ok()
        .map(|m| m.method)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub version: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "ResponseData::is_empty")]
    pub data: ResponseData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl ResponseData {
    pub fn is_empty(&self) -> bool {
        self.users.is_none() && self.user.is_none()
    }
}

impl Response {
    /// Flips the response to the error state. Any payload collected before
    /// the failure is dropped.
    pub fn set_error(&mut self, err: &Error) {
        self.status = Status::Error;
        self.error = Some(err.to_string());
        self.message = None;
        self.data = ResponseData::default();
    }

    pub fn from_error(err: &Error) -> Self {
        let mut response = Self::default();
        response.set_error(err);
        response
    }

    pub fn marshal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
