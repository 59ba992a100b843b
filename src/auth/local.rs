//! Identity headers for a locally running platform stack

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::config::LocalAuthOptions;

pub const PRINCIPAL_TYPE_HEADER: HeaderName = HeaderName::from_static("appd-pty");
pub const PRINCIPAL_ID_HEADER: HeaderName = HeaderName::from_static("appd-pid");
pub const TENANT_ID_HEADER: HeaderName = HeaderName::from_static("appd-tid");

/// Add the identity headers a local platform stack expects in place of a token.
///
/// Principal type and id are base64 encoded, the tenant id is sent as is.
pub fn add_local_auth_headers(
    headers: &mut HeaderMap,
    options: &LocalAuthOptions,
) -> Result<(), InvalidHeaderValue> {
    headers.insert(
        PRINCIPAL_TYPE_HEADER,
        HeaderValue::from_str(&STANDARD.encode(&options.principal_type))?,
    );
    headers.insert(
        PRINCIPAL_ID_HEADER,
        HeaderValue::from_str(&STANDARD.encode(&options.principal_id))?,
    );
    headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&options.tenant_id)?);
    Ok(())
}
