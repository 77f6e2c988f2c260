use anyhow::Context;
use base64ct::{Base64, Encoding};
use url::Url;

pub const OAUTH_CALLBACK_PATH: &str = "/api/oauth/callback";

/// Inputs for the OAuth portal sign-in URL.
#[derive(Debug, Clone)]
pub struct LoginUrl {
    pub portal_url: String,
    pub app_id: String,
    pub origin: String,
}

impl LoginUrl {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            portal_url: std::env::var("OAUTH_PORTAL_URL").context("OAUTH_PORTAL_URL is not set")?,
            app_id: std::env::var("APP_ID").context("APP_ID is not set")?,
            origin: std::env::var("APP_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into()),
        })
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), OAUTH_CALLBACK_PATH)
    }

    /// `{portal}/app-auth?appId=..&redirectUri=..&state=..&type=signIn`; `state`
    /// is the base64 of the redirect URI so the callback can recover it.
    pub fn to_url(&self) -> anyhow::Result<String> {
        let redirect_uri = self.redirect_uri();
        let state = Base64::encode_string(redirect_uri.as_bytes());

        let mut url = Url::parse(&format!("{}/app-auth", self.portal_url.trim_end_matches('/')))
            .with_context(|| format!("invalid portal url {}", self.portal_url))?;
        url.query_pairs_mut()
            .append_pair("appId", &self.app_id)
            .append_pair("redirectUri", &redirect_uri)
            .append_pair("state", &state)
            .append_pair("type", "signIn");
        Ok(url.into())
    }
}
