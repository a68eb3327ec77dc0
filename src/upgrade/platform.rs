//! Platform detection for OS and architecture.

/// The `{os}-{arch}` tag of the running platform, e.g. `"linux-amd64"`.
///
/// Names follow the convention the update bucket is published with:
/// - OS: `"linux"`, `"darwin"`, `"windows"`, `"freebsd"`, ...
/// - Arch: `"amd64"`, `"arm64"`, `"386"`, `"ppc64le"`, `"loong64"`, ...
///
/// The tag is derived from the compile target and cannot be configured.
pub fn platform_tag() -> String {
    tag_for(std::env::consts::OS, std::env::consts::ARCH, cfg!(target_endian = "little"))
}

fn tag_for(os: &str, arch: &str, little_endian: bool) -> String {
    let os = match os {
        "macos" => "darwin",
        other => other,
    };

    let arch = match (arch, little_endian) {
        ("x86_64", _) => "amd64",
        ("aarch64", _) => "arm64",
        ("x86", _) => "386",
        ("loongarch64", _) => "loong64",
        ("powerpc64", true) => "ppc64le",
        ("powerpc64", false) => "ppc64",
        ("mips64", true) => "mips64le",
        ("mips", true) => "mipsle",
        (other, _) => other,
    };

    format!("{os}-{arch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping() {
        assert_eq!(tag_for("linux", "x86_64", true), "linux-amd64");
        assert_eq!(tag_for("macos", "aarch64", true), "darwin-arm64");
        assert_eq!(tag_for("windows", "x86", true), "windows-386");
        assert_eq!(tag_for("linux", "arm", true), "linux-arm");
        assert_eq!(tag_for("linux", "riscv64", true), "linux-riscv64");
        assert_eq!(tag_for("linux", "s390x", false), "linux-s390x");
    }

    #[test]
    fn test_endian_sensitive_arch_names() {
        assert_eq!(tag_for("linux", "powerpc64", true), "linux-ppc64le");
        assert_eq!(tag_for("aix", "powerpc64", false), "aix-ppc64");
        assert_eq!(tag_for("linux", "mips64", true), "linux-mips64le");
        assert_eq!(tag_for("linux", "mips64", false), "linux-mips64");
        assert_eq!(tag_for("linux", "mips", true), "linux-mipsle");
        assert_eq!(tag_for("linux", "loongarch64", true), "linux-loong64");
    }

    #[test]
    fn test_platform_tag_is_stable() {
        let tag = platform_tag();
        assert_eq!(tag, platform_tag());
        assert_eq!(tag.split('-').count(), 2, "unexpected tag: {tag}");
    }
}
