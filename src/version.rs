//! Engine version reporting for embedders.

/// Version string of the engine, as published.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Version split into `(major, minor, patch)`.
pub fn version_parts() -> (u32, u32, u32) {
    (
        parse_part(env!("CARGO_PKG_VERSION_MAJOR")),
        parse_part(env!("CARGO_PKG_VERSION_MINOR")),
        parse_part(env!("CARGO_PKG_VERSION_PATCH")),
    )
}

fn parse_part(part: &str) -> u32 {
    part.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_match_the_version_string() {
        let (major, minor, patch) = version_parts();
        assert_eq!(version(), format!("{major}.{minor}.{patch}"));
    }
}
