use reqwest::Client;

pub const APP_USER_AGENT: &str = "TesutoLauncher/0.1.0";

/// Header set sent with every artifact GET.
pub const IDENTITY_ENCODING: &[(&str, &str)] = &[("Accept-Encoding", "identity")];

/// Shared builder settings. Timeouts are set per request by the fetcher.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(APP_USER_AGENT).build()
}
