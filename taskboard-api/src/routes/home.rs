/// Landing page
///
/// ```text
/// GET /
/// ```

use axum::Extension;
use axum_extra::extract::CookieJar;
use serde_json::json;
use taskboard_shared::auth::principal::Principal;

use crate::{error::ApiResult, notice::Outcome};

pub async fn index(Extension(principal): Extension<Principal>, jar: CookieJar) -> ApiResult<Outcome> {
    Outcome::render(
        jar,
        &json!({
            "principal": principal,
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}
