use std::fmt;

/// In-image location of the student's script
pub const SCRIPT_IN_IMAGE: &str = "/tmp/script.sh";

/// System packages needed to build CPython from source under pyenv.
pub const BUILD_DEPENDENCIES: &[&str] = &[
    "curl",
    "git",
    "build-essential",
    "libssl-dev",
    "zlib1g-dev",
    "libbz2-dev",
    "libreadline-dev",
    "libsqlite3-dev",
    "wget",
    "llvm",
    "libncursesw5-dev",
    "xz-utils",
    "tk-dev",
    "libxml2-dev",
    "libxmlsec1-dev",
    "libffi-dev",
    "liblzma-dev",
    "ca-certificates",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From(String),
    Env(String, String),
    Copy(String, String),
    Run(String),
    Comment(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::From(image) => write!(f, "FROM {}", image),
            Instruction::Env(key, value) => write!(f, "ENV {}={}", key, value),
            Instruction::Copy(src, dst) => write!(f, "COPY {} {}", src, dst),
            Instruction::Run(cmd) => write!(f, "RUN {}", cmd),
            Instruction::Comment(text) => write!(f, "# {}", text),
        }
    }
}

/// Dockerfile that installs the build toolchain and runs the student's script as the last layer.
#[derive(Debug, Clone)]
pub struct BuildDescriptor {
    pub instructions: Vec<Instruction>,
}

impl BuildDescriptor {
    /// `script_rel` is relative to the cloned repository, which sits at `repo/` in the build context.
    pub fn for_script(base_image: &str, script_rel: &str) -> Self {
        let packages = BUILD_DEPENDENCIES
            .chunks(6)
            .map(|chunk| chunk.join(" "))
            .collect::<Vec<_>>()
            .join(" \\\n    ");

        let instructions = vec![
            Instruction::From(base_image.to_string()),
            Instruction::Env("DEBIAN_FRONTEND".into(), "noninteractive".into()),
            Instruction::Run(format!("apt-get update && apt-get install -y {}", packages)),
            Instruction::Comment("pyenv environment".into()),
            Instruction::Env("PYENV_ROOT".into(), "$HOME/.pyenv".into()),
            Instruction::Env(
                "PATH".into(),
                "$PYENV_ROOT/shims:$PYENV_ROOT/bin:$PATH".into(),
            ),
            Instruction::Copy(
                format!("repo/{}", script_rel.trim_start_matches("./")),
                SCRIPT_IN_IMAGE.to_string(),
            ),
            Instruction::Run(format!(
                "chmod +x {0} && bash {0}",
                SCRIPT_IN_IMAGE
            )),
        ];

        Self { instructions }
    }

    pub fn render(&self) -> String {
        let mut out = self
            .instructions
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_layout() {
        let desc = BuildDescriptor::for_script("debian:latest", "setup/install.sh");
        assert_eq!(
            desc.instructions.first(),
            Some(&Instruction::From("debian:latest".to_string()))
        );
        assert_eq!(
            desc.instructions.last(),
            Some(&Instruction::Run(
                "chmod +x /tmp/script.sh && bash /tmp/script.sh".to_string()
            ))
        );
        assert!(desc.instructions.contains(&Instruction::Copy(
            "repo/setup/install.sh".to_string(),
            "/tmp/script.sh".to_string()
        )));
    }

    #[test]
    fn test_render_contains_environment() {
        let text = BuildDescriptor::for_script("debian:latest", "./install.sh").render();
        assert!(text.starts_with("FROM debian:latest\n"));
        assert!(text.contains("ENV DEBIAN_FRONTEND=noninteractive"));
        assert!(text.contains("ENV PYENV_ROOT=$HOME/.pyenv"));
        assert!(text.contains("ENV PATH=$PYENV_ROOT/shims:$PYENV_ROOT/bin:$PATH"));
        assert!(text.contains("COPY repo/install.sh /tmp/script.sh"));
        for pkg in BUILD_DEPENDENCIES {
            assert!(text.contains(pkg), "missing package {pkg}");
        }
        assert!(text
            .trim_end()
            .ends_with("RUN chmod +x /tmp/script.sh && bash /tmp/script.sh"));
    }
}
