//! uid → display name resolution via the profile endpoint.

use tracing::debug;

use crate::api::LiveApi;
use crate::error::AcfunError;
use crate::retry::{self, RetryPolicy};

/// Resolve a broadcaster's display name.
///
/// A non-zero result code means "no such user" and yields an empty string;
/// that is a normal outcome and is not retried.
pub(crate) async fn resolve_name(
    api: &dyn LiveApi,
    retry: &RetryPolicy,
    uid: u64,
) -> Result<String, AcfunError> {
    let response = retry::run(retry, "identity resolution", || api.user_profile(uid)).await?;

    if response.result != 0 {
        debug!(uid, result = response.result, "no such user");
        return Ok(String::new());
    }

    Ok(response.profile.map(|p| p.name).unwrap_or_default())
}
