//! Transport layer for the AcFun live endpoints.
//!
//! [`LiveApi`] is the seam between protocol logic and HTTP: each method is
//! one upstream round-trip decoded into a typed response. [`HttpApi`] is the
//! production implementation; tests substitute in-memory doubles.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::config::{self, AcfunConfig, DEFAULT_USER_AGENT};
use crate::error::AcfunError;
use crate::models::{
    ChannelListEnvelope, ChannelPage, SessionToken, StartPlayResponse, UserProfileResponse,
    VisitorLoginResponse,
};

const CHANNEL_LIST_URL: &str = "https://live.acfun.cn/api/channel/list";
const USER_INFO_URL: &str = "https://www.acfun.cn/rest/pc-direct/user/userInfo";
const LIVE_PAGE_URL: &str = "https://live.acfun.cn/live/";
const VISITOR_LOGIN_URL: &str = "https://id.app.acfun.cn/rest/app/visitor/login";
const START_PLAY_URL: &str = "https://api.kuaishouzt.com/rest/zt/live/web/startPlay";

/// One round-trip per method, decoded into wire models. All transport and
/// decoding faults surface as `Err`; upstream result codes are left for the
/// protocol layer to interpret.
#[async_trait]
pub trait LiveApi: Send + Sync {
    /// Fetch one page of the live channel listing.
    async fn channel_page(&self, cursor: &str) -> Result<ChannelPage, AcfunError>;

    /// Fetch a broadcaster's profile.
    async fn user_profile(&self, uid: u64) -> Result<UserProfileResponse, AcfunError>;

    /// Fetch the broadcaster's live page and extract the `_did` device
    /// cookie it sets.
    async fn device_id(&self, uid: u64) -> Result<String, AcfunError>;

    /// Perform the anonymous visitor login carrying the device cookie.
    async fn visitor_login(&self, device_id: &str) -> Result<VisitorLoginResponse, AcfunError>;

    /// Request playback for a broadcaster with a negotiated session.
    async fn start_play(
        &self,
        token: &SessionToken,
        uid: u64,
    ) -> Result<StartPlayResponse, AcfunError>;
}

/// Production transport built on reqwest.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    headers: HeaderMap,
}

impl HttpApi {
    pub fn new(config: &AcfunConfig) -> Self {
        let client = config::default_client(config);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3"),
        );

        Self { client, headers }
    }
}

#[async_trait]
impl LiveApi for HttpApi {
    async fn channel_page(&self, cursor: &str) -> Result<ChannelPage, AcfunError> {
        let envelope = self
            .client
            .get(CHANNEL_LIST_URL)
            .headers(self.headers.clone())
            .query(&[("pcursor", cursor)])
            .send()
            .await?
            .json::<ChannelListEnvelope>()
            .await?;

        Ok(ChannelPage::from_envelope(envelope))
    }

    async fn user_profile(&self, uid: u64) -> Result<UserProfileResponse, AcfunError> {
        let response = self
            .client
            .get(USER_INFO_URL)
            .headers(self.headers.clone())
            .query(&[("userId", uid.to_string())])
            .send()
            .await?
            .json::<UserProfileResponse>()
            .await?;

        Ok(response)
    }

    async fn device_id(&self, uid: u64) -> Result<String, AcfunError> {
        let response = self
            .client
            .get(format!("{LIVE_PAGE_URL}{uid}"))
            .headers(self.headers.clone())
            .send()
            .await?;

        extract_cookie(response.headers(), "_did").ok_or(AcfunError::MissingCookie("_did"))
    }

    async fn visitor_login(&self, device_id: &str) -> Result<VisitorLoginResponse, AcfunError> {
        debug!(device_id, "performing anonymous visitor login");
        let response = self
            .client
            .post(VISITOR_LOGIN_URL)
            .headers(self.headers.clone())
            .header(header::COOKIE, format!("_did={device_id}"))
            .form(&[("sid", "acfun.api.visitor")])
            .send()
            .await?
            .json::<VisitorLoginResponse>()
            .await?;

        Ok(response)
    }

    async fn start_play(
        &self,
        token: &SessionToken,
        uid: u64,
    ) -> Result<StartPlayResponse, AcfunError> {
        let params = [
            ("subBiz", "mainApp".to_string()),
            ("kpn", "ACFUN_APP".to_string()),
            ("kpf", "PC_WEB".to_string()),
            ("userId", token.user_id.to_string()),
            ("did", token.device_id.clone()),
            ("acfun.api.visitor_st", token.service_token.clone()),
        ];

        let response = self
            .client
            .post(START_PLAY_URL)
            .headers(self.headers.clone())
            .header(header::REFERER, "https://live.acfun.cn/")
            .query(&params)
            .form(&[("authorId", uid.to_string())])
            .send()
            .await?
            .json::<StartPlayResponse>()
            .await?;

        Ok(response)
    }
}

/// Pull a named cookie out of the `Set-Cookie` response headers.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::SET_COOKIE) {
        if let Ok(cookie_str) = value.to_str()
            && let Some(cookie_part) = cookie_str.split(';').next()
            && let Some((cookie_name, cookie_value)) = cookie_part.split_once('=')
            && cookie_name.trim() == name
        {
            return Some(cookie_value.trim().to_owned());
        }
    }
    None
}
