//! Build identity: package version plus the git state it was built from.
//!
//! Used for the `User-Agent` header on every vendor request and for the
//! CLI's startup log line.

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown" outside a checkout.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time, or "unknown" outside a checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// First seven characters of [`GIT_SHA`].
pub fn short_sha() -> &'static str {
    GIT_SHA.get(..7).unwrap_or(GIT_SHA)
}

/// `{version}+{branch}.{sha}`, with `.dirty` appended for a dirty tree.
pub fn version_string() -> String {
    let dirty = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{GIT_BRANCH}.{}{dirty}", short_sha())
}

/// Default `User-Agent`: `bifrost/{version} (+{sha})`.
pub fn user_agent() -> String {
    format!("bifrost/{PKG_VERSION} (+{})", short_sha())
}
