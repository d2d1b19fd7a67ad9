use git_version::git_version;

// include -modified if the working tree has uncommitted changes
const COMMIT: &str = git_version!(
    args = ["--abbrev=10", "--always", "--dirty=-modified"],
    fallback = "unknown"
);

/// Version string stamped into the processed marker, e.g. `v0.1.0`.
pub fn script_version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

pub fn get_system_info() -> String {
    let profile = if cfg!(debug_assertions) {
        "Dev"
    } else {
        "Release"
    };

    format!(
        "{} {}\nCommit: {}\n{} build",
        env!("CARGO_PKG_NAME"),
        script_version(),
        COMMIT,
        profile
    )
}
