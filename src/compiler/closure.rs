//! # Closure Compiler Invoker
//!
//! Runs the Closure Compiler once per file as an external process.
//!
//! ## Pipeline per file:
//! 1. Create a temporary output next to the destination
//! 2. Run the compiler with the configured level, language and warning mode
//! 3. Parse the `N error(s)` summary from stderr
//! 4. On success rename the temporary file over the destination, otherwise
//!    drop it so the previous destination is left untouched
//!
//! Each call spawns its own process, so one instance may serve many
//! concurrent tasks.
//!
//! ## Example:
//! ```rust,no_run
//! use js_compress::compiler::{ClosureCompiler, CompilerSettings};
//!
//! let compiler = ClosureCompiler::new(CompilerSettings::default())?;
//! # Ok::<(), js_compress::CompressError>(())
//! ```

use super::tool_resolver::{CompilerCommand, ToolResolver};
use super::{CompileInvoker, CompileOutcome, CompressionTask};
use crate::error::CompressError;
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tracing::{debug, warn};

/// JavaScript language level of input and output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguageMode {
    #[serde(rename = "ECMASCRIPT3")]
    Ecmascript3,
    #[default]
    #[serde(rename = "ECMASCRIPT5")]
    Ecmascript5,
    #[serde(rename = "ECMASCRIPT5_STRICT")]
    Ecmascript5Strict,
    #[serde(rename = "ECMASCRIPT6")]
    Ecmascript6,
    #[serde(rename = "ECMASCRIPT6_STRICT")]
    Ecmascript6Strict,
    #[serde(rename = "ECMASCRIPT6_TYPED")]
    Ecmascript6Typed,
}

impl LanguageMode {
    pub const ALL: [Self; 6] = [
        Self::Ecmascript6Strict,
        Self::Ecmascript6,
        Self::Ecmascript5Strict,
        Self::Ecmascript5,
        Self::Ecmascript3,
        Self::Ecmascript6Typed,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Ecmascript3 => "ECMASCRIPT3",
            Self::Ecmascript5 => "ECMASCRIPT5",
            Self::Ecmascript5Strict => "ECMASCRIPT5_STRICT",
            Self::Ecmascript6 => "ECMASCRIPT6",
            Self::Ecmascript6Strict => "ECMASCRIPT6_STRICT",
            Self::Ecmascript6Typed => "ECMASCRIPT6_TYPED",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }

    /// Modes current compiler releases no longer accept under their own id
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Ecmascript3 | Self::Ecmascript6Typed)
    }

    /// Value understood by current compiler releases
    fn flag_value(&self) -> &'static str {
        match self {
            // ES5 is the lowest level still supported
            Self::Ecmascript3 => "ECMASCRIPT5",
            // ES6 modules are always strict
            Self::Ecmascript6 | Self::Ecmascript6Strict | Self::Ecmascript6Typed => "ECMASCRIPT_2015",
            other => other.id(),
        }
    }
}

/// Optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationLevel {
    WhitespaceOnly,
    #[default]
    SimpleOptimizations,
    AdvancedOptimizations,
}

impl CompilationLevel {
    pub fn id(&self) -> &'static str {
        match self {
            Self::WhitespaceOnly => "WHITESPACE_ONLY",
            Self::SimpleOptimizations => "SIMPLE_OPTIMIZATIONS",
            Self::AdvancedOptimizations => "ADVANCED_OPTIMIZATIONS",
        }
    }
}

/// Amount of warnings the compiler reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    #[default]
    Quiet,
    Default,
    Verbose,
}

impl WarningLevel {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Quiet => "QUIET",
            Self::Default => "DEFAULT",
            Self::Verbose => "VERBOSE",
        }
    }
}

macro_rules! impl_id_parsing {
    ($ty:ty, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = CompressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_uppercase();
                [$($variant),+]
                    .into_iter()
                    .find(|v: &$ty| v.id() == wanted)
                    .ok_or_else(|| CompressError::Config(format!("Unknown {} '{}'", stringify!($ty), s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }
    };
}

impl_id_parsing!(
    LanguageMode,
    [
        LanguageMode::Ecmascript3,
        LanguageMode::Ecmascript5,
        LanguageMode::Ecmascript5Strict,
        LanguageMode::Ecmascript6,
        LanguageMode::Ecmascript6Strict,
        LanguageMode::Ecmascript6Typed,
    ]
);
impl_id_parsing!(
    CompilationLevel,
    [
        CompilationLevel::WhitespaceOnly,
        CompilationLevel::SimpleOptimizations,
        CompilationLevel::AdvancedOptimizations,
    ]
);
impl_id_parsing!(WarningLevel, [WarningLevel::Quiet, WarningLevel::Default, WarningLevel::Verbose]);

/// Compiler specific options, owned by the invoker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Compiler executable; looked up on `PATH` when unset
    pub compiler: Option<PathBuf>,
    /// Compiler jar, run with `java -jar`
    pub compiler_jar: Option<PathBuf>,
    /// Java launcher used with `compiler_jar`
    pub java: PathBuf,
    pub compilation_level: CompilationLevel,
    pub language_in: LanguageMode,
    pub language_out: LanguageMode,
    pub warning_level: WarningLevel,
    /// Enable the compiler's debug renaming
    pub debug: bool,
    /// Honour `@export` annotations
    pub generate_exports: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            compiler: None,
            compiler_jar: None,
            java: PathBuf::from("java"),
            compilation_level: CompilationLevel::default(),
            language_in: LanguageMode::default(),
            language_out: LanguageMode::default(),
            warning_level: WarningLevel::default(),
            debug: false,
            generate_exports: false,
        }
    }
}

impl CompilerSettings {
    /// Load the `compiler` section of a JSON config file.
    ///
    /// A missing file yields the defaults. Relative compiler paths are taken
    /// relative to the file's own directory, like the rest of the file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Section {
            compiler: CompilerSettings,
        }

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let section: Section = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid compiler section in {}: {}", path.display(), e))?;
        let base = path.parent().unwrap_or(Path::new(""));
        Ok(section.compiler.resolve_against(base))
    }

    /// Resolve relative `compiler` and `compiler_jar` paths against `base`.
    /// `java` stays as is so a bare name is still looked up on `PATH`.
    pub fn resolve_against(mut self, base: &Path) -> Self {
        for path in [&mut self.compiler, &mut self.compiler_jar].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// `CompileInvoker` backed by an external Closure Compiler
pub struct ClosureCompiler {
    command: CompilerCommand,
    settings: CompilerSettings,
}

impl ClosureCompiler {
    /// Resolve the compiler executable and build an invoker
    pub fn new(settings: CompilerSettings) -> Result<Self, CompressError> {
        let command = ToolResolver::new().resolve(
            settings.compiler.as_deref(),
            settings.compiler_jar.as_deref(),
            &settings.java,
        )?;
        Ok(Self::with_command(command, settings))
    }

    /// Build an invoker around an already resolved command
    pub fn with_command(command: CompilerCommand, settings: CompilerSettings) -> Self {
        for mode in [settings.language_in, settings.language_out] {
            if mode.is_legacy() {
                warn!("Language mode {} is no longer supported, using {}", mode, mode.flag_value());
            }
        }
        Self { command, settings }
    }

    pub fn command(&self) -> &CompilerCommand {
        &self.command
    }

    /// Compiler flags for one task writing to `output`
    pub fn build_args(&self, task: &CompressionTask, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--js".into(),
            task.source.clone().into(),
            "--js_output_file".into(),
            output.into(),
            "--charset".into(),
            task.encoding.clone().into(),
            "--compilation_level".into(),
            self.settings.compilation_level.id().into(),
            "--language_in".into(),
            self.settings.language_in.flag_value().into(),
            "--language_out".into(),
            self.settings.language_out.flag_value().into(),
            "--warning_level".into(),
            self.settings.warning_level.id().into(),
        ];

        for extern_file in &task.externs {
            args.push("--externs".into());
            args.push(extern_file.clone().into());
        }

        if self.settings.debug {
            args.push("--debug".into());
        }
        if self.settings.generate_exports {
            args.push("--generate_exports".into());
        }

        args
    }

    /// Number of errors from the compiler's `N error(s), M warning(s)` summary
    pub fn parse_error_count(stderr: &str) -> Option<usize> {
        stderr.lines().rev().find_map(|line| {
            let idx = line.find(" error(s)")?;
            line[..idx].split_whitespace().last()?.parse().ok()
        })
    }

    async fn compress_file(&self, task: &CompressionTask) -> Result<CompileOutcome> {
        debug!(
            "Compressing JS {} to {}",
            file_name(&task.source),
            file_name(&task.destination)
        );

        let parent = task
            .destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut builder = tempfile::Builder::new();
        builder.prefix(".jscompress-").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Same mode as a plain create; the umask still applies
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let temp_output = builder
            .tempfile_in(parent)
            .map_err(|e| anyhow::anyhow!("Cannot create temporary output in {}: {}", parent.display(), e))?
            .into_temp_path();

        let output = tokio::process::Command::new(&self.command.program)
            .args(&self.command.leading_args)
            .args(self.build_args(task, &temp_output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                CompressError::Compiler(format!("Failed to execute {}: {}", self.command.program.display(), e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let error_count = Self::parse_error_count(&stderr).unwrap_or(0);

        if output.status.success() && error_count == 0 {
            // An existing output keeps its mode across the rename
            if let Ok(metadata) = std::fs::metadata(&task.destination) {
                std::fs::set_permissions(&temp_output, metadata.permissions()).map_err(|e| {
                    anyhow::anyhow!("Cannot set permissions of {}: {}", task.destination.display(), e)
                })?;
            }
            temp_output.persist(&task.destination).map_err(|e| {
                anyhow::anyhow!("Failed to write {}: {}", task.destination.display(), e.error)
            })?;
            return Ok(CompileOutcome::succeeded());
        }

        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}: {}", file_name(&task.source), line);
        }

        // A crash without a summary line still counts as one error
        Ok(CompileOutcome::failed(error_count.max(1)))
    }
}

impl CompileInvoker for ClosureCompiler {
    fn compress<'a>(&'a self, task: &'a CompressionTask) -> BoxFuture<'a, Result<CompileOutcome>> {
        self.compress_file(task).boxed()
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(source: &str, destination: &str) -> CompressionTask {
        CompressionTask {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
            externs: Vec::new(),
            encoding: "UTF-8".to_string(),
        }
    }

    #[test]
    fn test_language_mode_ids() {
        assert_eq!(LanguageMode::default(), LanguageMode::Ecmascript5);
        assert_eq!(LanguageMode::from_id("ECMASCRIPT5_STRICT"), Some(LanguageMode::Ecmascript5Strict));
        assert_eq!(LanguageMode::from_id(""), None);
        assert_eq!(LanguageMode::from_id("ECMASCRIPT7"), None);
        for mode in LanguageMode::ALL {
            assert_eq!(mode.id().parse::<LanguageMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(
            "advanced_optimizations".parse::<CompilationLevel>().unwrap(),
            CompilationLevel::AdvancedOptimizations
        );
        assert_eq!("VERBOSE".parse::<WarningLevel>().unwrap(), WarningLevel::Verbose);
        assert!("LOUD".parse::<WarningLevel>().is_err());
        assert_eq!(CompilationLevel::default().to_string(), "SIMPLE_OPTIMIZATIONS");
    }

    #[test]
    fn test_settings_serde_ids() {
        let settings: CompilerSettings =
            serde_json::from_str(r#"{ "language_in": "ECMASCRIPT6", "warning_level": "VERBOSE" }"#).unwrap();
        assert_eq!(settings.language_in, LanguageMode::Ecmascript6);
        assert_eq!(settings.language_out, LanguageMode::Ecmascript5);
        assert_eq!(settings.warning_level, WarningLevel::Verbose);
        assert_eq!(settings.compilation_level, CompilationLevel::SimpleOptimizations);
    }

    #[test]
    fn test_build_args() {
        let compiler = ClosureCompiler::with_command(
            CompilerCommand::new("closure-compiler"),
            CompilerSettings {
                debug: true,
                generate_exports: true,
                language_in: LanguageMode::Ecmascript6,
                ..Default::default()
            },
        );
        let mut task = task("/js/app.js", "/js/app.min.js");
        task.externs = vec![PathBuf::from("/externs/jquery.js"), PathBuf::from("/externs/node.js")];

        let args: Vec<String> = compiler
            .build_args(&task, Path::new("/js/.jscompress-1.tmp"))
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(
            args,
            vec![
                "--js",
                "/js/app.js",
                "--js_output_file",
                "/js/.jscompress-1.tmp",
                "--charset",
                "UTF-8",
                "--compilation_level",
                "SIMPLE_OPTIMIZATIONS",
                "--language_in",
                "ECMASCRIPT_2015",
                "--language_out",
                "ECMASCRIPT5",
                "--warning_level",
                "QUIET",
                "--externs",
                "/externs/jquery.js",
                "--externs",
                "/externs/node.js",
                "--debug",
                "--generate_exports",
            ]
        );
    }

    #[test]
    fn test_legacy_language_modes_are_mapped() {
        let compiler = ClosureCompiler::with_command(
            CompilerCommand::new("closure-compiler"),
            CompilerSettings {
                language_in: LanguageMode::Ecmascript6Typed,
                language_out: LanguageMode::Ecmascript3,
                ..Default::default()
            },
        );
        let args: Vec<String> = compiler
            .build_args(&task("/js/app.js", "/js/app.min.js"), Path::new("/js/out.tmp"))
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        let flag = |name: &str| args[args.iter().position(|a| a == name).unwrap() + 1].clone();
        assert_eq!(flag("--language_in"), "ECMASCRIPT_2015");
        assert_eq!(flag("--language_out"), "ECMASCRIPT5");
        assert!(LanguageMode::Ecmascript3.is_legacy());
        assert!(!LanguageMode::Ecmascript5Strict.is_legacy());
    }

    #[tokio::test]
    async fn test_settings_paths_are_relative_to_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("jscompress.json");
        tokio::fs::write(
            &config_path,
            r#"{ "compiler": { "compiler_jar": "tools/cc.jar", "compiler": "/opt/cc/bin/closure" } }"#,
        )
        .await
        .unwrap();

        let settings = CompilerSettings::from_file(&config_path).await.unwrap();

        assert_eq!(settings.compiler_jar, Some(temp_dir.path().join("tools/cc.jar")));
        assert_eq!(settings.compiler, Some(PathBuf::from("/opt/cc/bin/closure")));
        assert_eq!(settings.java, PathBuf::from("java"));
    }

    #[tokio::test]
    async fn test_settings_from_missing_file_are_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let settings = CompilerSettings::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(settings.compiler_jar, None);
        assert_eq!(settings.language_in, LanguageMode::Ecmascript5);
    }

    #[test]
    fn test_parse_error_count() {
        let stderr = "app.js:3:4: ERROR - Parse error. missing ; before statement\n\
                      var a = \n\
                      \n\
                      2 error(s), 1 warning(s)\n";
        assert_eq!(ClosureCompiler::parse_error_count(stderr), Some(2));
        assert_eq!(ClosureCompiler::parse_error_count("0 error(s), 3 warning(s)"), Some(0));
        assert_eq!(ClosureCompiler::parse_error_count("java.lang.OutOfMemoryError"), None);
        assert_eq!(ClosureCompiler::parse_error_count(""), None);
    }

    #[tokio::test]
    async fn test_missing_executable_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let compiler = ClosureCompiler::with_command(
            CompilerCommand::new(temp_dir.path().join("no-such-compiler")),
            CompilerSettings::default(),
        );
        let source = temp_dir.path().join("a.js");
        std::fs::write(&source, "var a = 1;").unwrap();
        let task = CompressionTask {
            source: source.clone(),
            destination: temp_dir.path().join("a.min.js"),
            externs: Vec::new(),
            encoding: "UTF-8".to_string(),
        };

        assert!(compiler.compress(&task).await.is_err());
        assert!(!task.destination.exists());
    }

    #[cfg(unix)]
    mod with_fake_compiler {
        use super::*;
        use tempfile::TempDir;

        // Strips blanks and newlines, fails for sources named *broken*
        const FAKE_COMPILER: &str = r#"
src=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --js) src="$2"; shift ;;
    --js_output_file) out="$2"; shift ;;
  esac
  shift
done
case "$src" in
  *broken*)
    echo "$src:1: ERROR - Parse error" >&2
    echo "2 error(s), 0 warning(s)" >&2
    exit 1 ;;
esac
tr -d ' \n' < "$src" > "$out"
"#;

        fn fake_compiler(dir: &Path) -> ClosureCompiler {
            let script = dir.join("fake-closure.sh");
            std::fs::write(&script, FAKE_COMPILER).unwrap();
            ClosureCompiler::with_command(CompilerCommand::new("/bin/sh").arg(&script), CompilerSettings::default())
        }

        fn leftover_temp_files(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .unwrap()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with(".jscompress-"))
                .count()
        }

        #[tokio::test]
        async fn test_successful_compression_writes_destination() {
            let temp_dir = TempDir::new().unwrap();
            let compiler = fake_compiler(temp_dir.path());
            let source = temp_dir.path().join("app.js");
            std::fs::write(&source, "var a = 1;\nvar b = 2;\n").unwrap();
            let task = CompressionTask {
                source,
                destination: temp_dir.path().join("app.min.js"),
                externs: Vec::new(),
                encoding: "UTF-8".to_string(),
            };

            let outcome = compiler.compress(&task).await.unwrap();

            assert_eq!(outcome, CompileOutcome::succeeded());
            assert_eq!(std::fs::read_to_string(&task.destination).unwrap(), "vara=1;varb=2;");
            assert_eq!(leftover_temp_files(temp_dir.path()), 0);
        }

        #[tokio::test]
        async fn test_existing_destination_keeps_its_mode() {
            use std::os::unix::fs::PermissionsExt;

            let temp_dir = TempDir::new().unwrap();
            let compiler = fake_compiler(temp_dir.path());
            let source = temp_dir.path().join("app.js");
            std::fs::write(&source, "var a = 1;").unwrap();
            let destination = temp_dir.path().join("app.min.js");
            std::fs::write(&destination, "old").unwrap();
            std::fs::set_permissions(&destination, std::fs::Permissions::from_mode(0o664)).unwrap();
            let task = CompressionTask {
                source,
                destination: destination.clone(),
                externs: Vec::new(),
                encoding: "UTF-8".to_string(),
            };

            let outcome = compiler.compress(&task).await.unwrap();

            assert_eq!(outcome, CompileOutcome::succeeded());
            assert_eq!(std::fs::read_to_string(&destination).unwrap(), "vara=1;");
            let mode = std::fs::metadata(&destination).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o664);
        }

        #[tokio::test]
        async fn test_new_destination_is_not_owner_only() {
            use std::os::unix::fs::PermissionsExt;

            let temp_dir = TempDir::new().unwrap();
            let compiler = fake_compiler(temp_dir.path());
            let source = temp_dir.path().join("app.js");
            std::fs::write(&source, "var a = 1;").unwrap();
            // Reference file created through the normal umask path
            let reference = temp_dir.path().join("reference.txt");
            std::fs::write(&reference, "").unwrap();
            let task = CompressionTask {
                source,
                destination: temp_dir.path().join("app.min.js"),
                externs: Vec::new(),
                encoding: "UTF-8".to_string(),
            };

            compiler.compress(&task).await.unwrap();

            let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode(&task.destination), mode(&reference));
        }

        #[tokio::test]
        async fn test_failed_compression_keeps_previous_destination() {
            let temp_dir = TempDir::new().unwrap();
            let compiler = fake_compiler(temp_dir.path());
            let source = temp_dir.path().join("broken.js");
            std::fs::write(&source, "var = ;").unwrap();
            let destination = temp_dir.path().join("broken.min.js");
            std::fs::write(&destination, "previous").unwrap();
            let task = CompressionTask {
                source,
                destination: destination.clone(),
                externs: Vec::new(),
                encoding: "UTF-8".to_string(),
            };

            let outcome = compiler.compress(&task).await.unwrap();

            assert_eq!(outcome, CompileOutcome::failed(2));
            assert_eq!(std::fs::read_to_string(&destination).unwrap(), "previous");
            assert_eq!(leftover_temp_files(temp_dir.path()), 0);
        }
    }
}
