//! Web-search routing by authentication mode.

use bifrost::generator::vendor_search_tool;
use bifrost::{AuthMode, SearchRoute, Tool, route_web_search};

#[test]
fn vendor_mode_routes_search_to_vendor() {
    assert_eq!(route_web_search(AuthMode::Glm), SearchRoute::Vendor);
    assert_eq!(vendor_search_tool(AuthMode::Glm), Some(Tool::WebSearch));
}

#[test]
fn other_modes_keep_host_search() {
    for mode in [
        AuthMode::GeminiApiKey,
        AuthMode::LoginWithGoogle,
        AuthMode::VertexAi,
    ] {
        assert_eq!(route_web_search(mode), SearchRoute::Host, "{mode:?}");
        assert_eq!(vendor_search_tool(mode), None);
    }
}

#[test]
fn auth_mode_parses_aliases() {
    assert_eq!("zhipu".parse::<AuthMode>().unwrap(), AuthMode::Glm);
    assert_eq!(" GLM ".parse::<AuthMode>().unwrap(), AuthMode::Glm);
    assert_eq!(
        "oauth-personal".parse::<AuthMode>().unwrap(),
        AuthMode::LoginWithGoogle
    );
}

#[test]
fn auth_mode_serde_uses_kebab_case() {
    let json = serde_json::to_string(&AuthMode::GeminiApiKey).unwrap();
    assert_eq!(json, "\"gemini-api-key\"");

    let parsed: AuthMode = serde_json::from_str("\"vertex-ai\"").unwrap();
    assert_eq!(parsed, AuthMode::VertexAi);
}
