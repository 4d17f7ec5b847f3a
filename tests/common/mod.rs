// Common test utilities shared across acceptance tests
//
// ## Test Isolation Strategy
//
// Each test gets its own workspace with NO GLOBAL STATE:
// - Cache directory: SWIFTRUN_HOME points into the workspace
// - Bin directory: SWIFTRUN_BINDIR points into the workspace
// - Config: XDG_CONFIG_HOME points at an empty directory
// - Build tool: SWIFTRUN_BUILD_TOOL points at a shell script that fakes
//   `swift build`, so no Swift toolchain is needed
//
// The fake tool appends one line per invocation to `builds.log` and writes an
// executable shell script at `.build/<configuration>/<name>` that prints
// `ran <name>: <args>` and exits with `$FAKE_EXIT` (default 0).
//
// Remote scripts use a fake `git` from `tools/`, put first on PATH by
// `path_with_tools`. It logs to `git.log`, turns `clone` into an empty
// package checkout and exits with `$FAKE_GIT_EXIT` (default 0).

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

pub struct TestWorkspace {
    temp_dir: TempDir,
    fixtures_dir: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let workspace = Self {
            temp_dir,
            fixtures_dir: project_root.join("fixtures/scripts"),
        };

        fs::create_dir_all(workspace.scripts_dir()).unwrap();
        fs::create_dir_all(workspace.path().join("config")).unwrap();
        workspace.write_build_tool(&format!(
            r#"echo "$@" >> '{log}'
test -f Package.swift || {{ echo "no Package.swift in $PWD" >&2; exit 1; }}
name=$(basename "$PWD")
mkdir -p ".build/$3"
cat > ".build/$3/$name" <<EOF
#!/bin/sh
echo "ran $name: \$*"
exit \${{FAKE_EXIT:-0}}
EOF
chmod +x ".build/$3/$name""#,
            log = workspace.build_log().display()
        ));
        workspace
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Working directory for invocations; scripts live here
    pub fn scripts_dir(&self) -> PathBuf {
        self.path().join("scripts")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path().join("cache")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn build_tool(&self) -> PathBuf {
        self.path().join("fake-swift")
    }

    pub fn build_log(&self) -> PathBuf {
        self.path().join("builds.log")
    }

    /// Package root generated for `name`
    pub fn package_root(&self, name: &str) -> PathBuf {
        self.cache_dir().join(name)
    }

    /// Replace the fake build tool's body
    pub fn write_build_tool(&self, body: &str) {
        let tool = self.build_tool();
        fs::write(&tool, format!("#!/bin/sh\n{}\n", body)).unwrap();
        make_executable(&tool);
    }

    /// `swiftrun` with every path pointed into this workspace
    pub fn swiftrun(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_swiftrun"));
        cmd.current_dir(self.scripts_dir())
            .env("SWIFTRUN_HOME", self.cache_dir())
            .env("SWIFTRUN_BINDIR", self.bin_dir())
            .env("SWIFTRUN_BUILD_TOOL", self.build_tool())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env_remove("SWIFTRUN_CONFIG")
            .env_remove("SWIFTRUN_BUILD_CONFIG")
            .env_remove("SWIFTRUN_DEBUG")
            .env_remove("RUST_LOG")
            .env_remove("VISUAL")
            .env_remove("EDITOR")
            .env_remove("FAKE_EXIT")
            .env_remove("FAKE_GIT_EXIT");
        cmd
    }

    pub fn git_log(&self) -> PathBuf {
        self.path().join("git.log")
    }

    /// Install the fake `git` and return a PATH that finds it first
    pub fn path_with_tools(&self) -> String {
        let tools = self.path().join("tools");
        fs::create_dir_all(&tools).unwrap();
        let git = tools.join("git");
        fs::write(
            &git,
            format!(
                r#"#!/bin/sh
echo "$@" >> '{log}'
if [ "${{FAKE_GIT_EXIT:-0}}" != 0 ]; then exit "$FAKE_GIT_EXIT"; fi
if [ "$1" = clone ]; then
  mkdir -p "$3/.git"
  echo '// swift-tools-version:5.2' > "$3/Package.swift"
fi
"#,
                log = self.git_log().display()
            ),
        )
        .unwrap();
        make_executable(&git);

        let inherited = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", tools.display(), inherited)
    }

    /// Arguments of every git invocation
    pub fn git_invocations(&self) -> Vec<String> {
        fs::read_to_string(self.git_log())
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Copy a fixture (file or directory) into the scripts directory
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let src = self.fixtures_dir.join(name);
        let dest = self.scripts_dir().join(name);
        if src.is_dir() {
            fs::create_dir_all(&dest).unwrap();
            for entry in fs::read_dir(&src).unwrap() {
                let entry = entry.unwrap();
                fs::copy(entry.path(), dest.join(entry.file_name())).unwrap();
            }
        } else {
            fs::copy(&src, &dest).unwrap();
        }
        dest
    }

    pub fn create_script(&self, name: &str, content: &str) -> PathBuf {
        let path = self.scripts_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Number of times the fake build tool ran
    pub fn build_count(&self) -> usize {
        fs::read_to_string(self.build_log())
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    /// Arguments of every build tool invocation
    pub fn build_invocations(&self) -> Vec<String> {
        fs::read_to_string(self.build_log())
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

pub fn make_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}
