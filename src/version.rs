//! Version and build information embedded by `build.rs`.

use std::fmt;

use crate::backend::OpenAiConfig;
use crate::persona::templates;

/// Build information embedded at compile time
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash, suffixed with `-dirty` for uncommitted builds
    pub git_revision: &'static str,
    pub build_timestamp: &'static str,
    /// Target triple (e.g., x86_64-unknown-linux-gnu)
    pub target: &'static str,
    pub profile: &'static str,
    /// Comma separated institution file stems compiled into the binary
    bundled_institutions: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_revision: env!("PERSONA_FORGE_GIT_REVISION"),
            build_timestamp: env!("PERSONA_FORGE_BUILD_TIMESTAMP"),
            target: env!("PERSONA_FORGE_TARGET"),
            profile: env!("PERSONA_FORGE_PROFILE"),
            bundled_institutions: env!("PERSONA_FORGE_BUNDLED_INSTITUTIONS"),
        }
    }

    /// e.g. "0.1.0+abc12345"
    pub fn full_version(&self) -> String {
        format!("{}+{}", self.version, self.git_revision)
    }

    pub fn bundled_institutions(&self) -> Vec<&'static str> {
        self.bundled_institutions
            .split(',')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = OpenAiConfig::default();

        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "Build Information:")?;
        writeln!(f, "  Git Hash:     {}", self.git_revision)?;
        writeln!(f, "  Built:        {} ({})", self.build_timestamp, self.profile)?;
        writeln!(f, "  Target:       {}", self.target)?;
        writeln!(f)?;
        writeln!(f, "Bundled Data:")?;
        writeln!(f, "  Institutions: {}", self.bundled_institutions().join(", "))?;
        writeln!(f, "  Templates:    {}", templates::all().len())?;
        writeln!(f, "  Text model:   {}", defaults.model)?;
        writeln!(f, "  Image model:  {}", defaults.image_model)
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}

/// Print version information to stdout
pub fn print_version() {
    print!("{}", build_info());
}
