use std::collections::HashMap;

use url::Url;
use url::form_urlencoded;

use crate::error::Error;

/// Credential artifact carried by an authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPayload {
    /// Implicit-style redirect with the token pair.
    Tokens {
        access_token: String,
        refresh_token: String,
    },
    /// Authorization code to exchange (PKCE).
    Code { code: String, state: Option<String> },
}

/// Extracts the credential artifact from a deep-link callback URL.
///
/// The fragment is checked before the query.
///
/// # Errors
///
/// Returns [`Error::Parse`] for an unparseable URL and [`Error::AuthFlow`]
/// when the redirect reports an error or carries no credentials.
pub fn parse_callback(callback_url: &str) -> Result<CallbackPayload, Error> {
    let url = Url::parse(callback_url)?;

    let fragment = url.fragment().map(params).unwrap_or_default();
    let query = url.query().map(params).unwrap_or_default();

    for component in [&fragment, &query] {
        if let Some(payload) = from_params(component)? {
            return Ok(payload);
        }
    }
    Err(Error::AuthFlow("callback carries no credentials".into()))
}

fn params(component: &str) -> HashMap<String, String> {
    form_urlencoded::parse(component.as_bytes())
        .into_owned()
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

fn from_params(params: &HashMap<String, String>) -> Result<Option<CallbackPayload>, Error> {
    if let Some(error) = params.get("error") {
        let desc = params
            .get("error_description")
            .map_or(error.as_str(), String::as_str);
        tracing::warn!(error = %error, description = %desc, "Authorization redirect reported an error");
        return Err(Error::AuthFlow(desc.to_string()));
    }

    if let (Some(access_token), Some(refresh_token)) =
        (params.get("access_token"), params.get("refresh_token"))
    {
        return Ok(Some(CallbackPayload::Tokens {
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
        }));
    }

    Ok(params.get("code").map(|code| CallbackPayload::Code {
        code: code.clone(),
        state: params.get("state").cloned(),
    }))
}
