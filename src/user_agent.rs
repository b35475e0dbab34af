//! Shared User-Agent strings for catalog and download HTTP clients.

/// Project URL for User-Agent identification on catalog API calls.
const PROJECT_UA_URL: &str = "https://github.com/fierce/transit-downloader";

/// Browser User-Agent sent with every file download.
///
/// Several resource hosts reject requests carrying a library or tool
/// User-Agent, so downloads always present as a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default User-Agent for catalog API requests (identifies the tool).
#[must_use]
pub(crate) fn catalog_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("transit-downloader/{version} (+{PROJECT_UA_URL})")
}
