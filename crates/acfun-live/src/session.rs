//! Anonymous session negotiation.

use tracing::debug;

use crate::api::LiveApi;
use crate::error::AcfunError;
use crate::models::SessionToken;
use crate::retry::{self, RetryPolicy};

/// Negotiate a fresh anonymous session for a broadcaster.
///
/// Two sequential calls: the live page yields the `_did` device cookie
/// (absence is a fault and re-runs the whole negotiation), then the visitor
/// login exchanges it for a user id and service token. A rejected login
/// (non-zero result) is a logical outcome and yields `None`.
///
/// Tokens are single-use; every resolution performs its own negotiation.
pub(crate) async fn negotiate(
    api: &dyn LiveApi,
    retry: &RetryPolicy,
    uid: u64,
) -> Result<Option<SessionToken>, AcfunError> {
    retry::run(retry, "session negotiation", || negotiate_once(api, uid)).await
}

async fn negotiate_once(api: &dyn LiveApi, uid: u64) -> Result<Option<SessionToken>, AcfunError> {
    let device_id = api.device_id(uid).await?;
    let login = api.visitor_login(&device_id).await?;

    if login.result != 0 {
        debug!(uid, result = login.result, "visitor login rejected");
        return Ok(None);
    }

    Ok(Some(SessionToken {
        user_id: login.user_id,
        service_token: login.visitor_st,
        device_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::api::testing::FakeApi;
    use crate::models::VisitorLoginResponse;

    fn policy() -> RetryPolicy {
        RetryPolicy::with_max_attempts(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn produces_token_from_cookie_and_login() {
        let mut api = FakeApi::default();
        api.device = Some("web_861001".to_string());
        api.login = Some(VisitorLoginResponse {
            result: 0,
            user_id: 3837271,
            visitor_st: "ChFhY2Z1bg".to_string(),
        });

        let token = negotiate(&api, &policy(), 23512).await.unwrap().unwrap();
        assert_eq!(token.user_id, 3837271);
        assert_eq!(token.service_token, "ChFhY2Z1bg");
        assert_eq!(token.device_id, "web_861001");
    }

    #[tokio::test]
    async fn rejected_login_is_a_logical_miss() {
        let mut api = FakeApi::default();
        api.device = Some("web_861001".to_string());
        api.login = Some(VisitorLoginResponse {
            result: 129,
            user_id: 0,
            visitor_st: String::new(),
        });

        let token = negotiate(&api, &policy(), 23512).await.unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn missing_device_cookie_is_a_fault() {
        let api = FakeApi::default(); // no device cookie fixture

        let result = negotiate(&api, &policy(), 23512).await;
        assert!(matches!(result, Err(AcfunError::MissingCookie("_did"))));
    }
}
