//! REST client for the authentication service's user management endpoints.

use std::error::Error as StdError;

use constcat::concat;
use derive_more::{Display, From};
use reqwest::{Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::{
    api::{self, user::Role},
    config,
};

const AUTH_PATH: &str = "/api/auth";
pub const USERS_PATH: &str = concat!(AUTH_PATH, "/users");
pub const CHANGE_ROLE_PATH: &str = concat!(AUTH_PATH, "/changeRole");

pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(config: config::Backend) -> Result<Self, InvalidBaseUrl> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(InvalidBaseUrl::NotABase(config.base_url));
        }
        Ok(Self {
            inner: reqwest::Client::new(),
            base_url,
        })
    }

    /// Joins `path` and then each of `segments`, percent-encoded, onto the
    /// base URL.
    fn endpoint<'a>(
        &self,
        path: &str,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path_segments) = url.path_segments_mut() {
            path_segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()))
                .extend(segments);
        }
        url
    }

    pub async fn list_users(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<api::User>, Error> {
        let mut url = self.endpoint(USERS_PATH, []);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        debug!(%url, "fetching users");

        let res = self.inner.get(url).bearer_auth(token).send().await?;
        let list = read_json::<api::user::List>(res).await?;
        Ok(list.users.unwrap_or_default())
    }

    pub async fn change_role(
        &self,
        token: &str,
        email: &str,
        new_role: Role,
    ) -> Result<api::Message, Error> {
        let url = self.endpoint(CHANGE_ROLE_PATH, []);
        debug!(%url, %email, %new_role, "changing role");

        let res = self
            .inner
            .put(url)
            .bearer_auth(token)
            .json(&api::user::ChangeRole {
                email: email.to_string(),
                new_role,
            })
            .send()
            .await?;
        read_message(res).await
    }

    pub async fn delete_user(
        &self,
        token: &str,
        id: &api::user::Id,
    ) -> Result<api::Message, Error> {
        let url = self.endpoint(USERS_PATH, [id.as_str()]);
        debug!(%url, "deleting user");

        let res = self.inner.delete(url).bearer_auth(token).send().await?;
        read_message(res).await
    }
}

#[derive(Debug, Display, From)]
pub enum Error {
    /// Backend answered with a non-2xx status.
    #[display("request rejected with {status}")]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },

    /// No usable response was obtained.
    #[from]
    #[display("{_0}")]
    Transport(reqwest::Error),

    /// A successful response carried a body that is not the expected JSON.
    #[from]
    #[display("malformed response body: {_0}")]
    Decode(serde_json::Error),
}

impl Error {
    /// Text shown to the operator, with `fallback` used when the backend
    /// rejected the request without a readable message.
    pub fn banner(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Rejected { message: None, .. } => fallback.to_string(),
            Self::Transport(_) => NETWORK_ERROR.to_string(),
            Self::Decode(_) => UNEXPECTED_RESPONSE.to_string(),
        }
    }
}

pub const NETWORK_ERROR: &str =
    "Network error: could not reach the server. Is the backend running?";
pub const UNEXPECTED_RESPONSE: &str =
    "Unexpected response from the server";

#[derive(Debug, Display, From)]
pub enum InvalidBaseUrl {
    #[from]
    #[display("invalid backend base URL: {_0}")]
    Parse(url::ParseError),

    #[display("backend base URL `{_0}` cannot carry a path")]
    NotABase(String),
}

impl StdError for InvalidBaseUrl {}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, Error> {
    let body = read_body(res).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn read_message(res: Response) -> Result<api::Message, Error> {
    let body = read_body(res).await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(api::Message::default());
    }
    Ok(serde_json::from_slice(&body)?)
}

async fn read_body(res: Response) -> Result<Vec<u8>, Error> {
    let status = res.status();
    if !status.is_success() {
        let message = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message.or(body.error));
        return Err(Error::Rejected { status, message });
    }
    Ok(res.bytes().await?.to_vec())
}
