//! Node domain model - the typed step variants and their factory

use crate::core::outputs::OutputRegistry;
use crate::core::vars::expand_variables;
use crate::error::{ExecutionError, ValidationError};
use crate::execution::shell::CommandRunner;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The closed set of step kinds a pipeline can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    ReadFile,
    RunScript,
    WriteFile,
}

impl NodeKind {
    /// Parse a declared kind string, case-insensitively
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.to_lowercase().as_str() {
            "readfile" => Some(NodeKind::ReadFile),
            "runscript" => Some(NodeKind::RunScript),
            "writefile" => Some(NodeKind::WriteFile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::ReadFile => "readfile",
            NodeKind::RunScript => "runscript",
            NodeKind::WriteFile => "writefile",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Copies a source file into the workspace under `{id}_{basename}`.
#[derive(Debug, Clone)]
pub struct ReadFileNode {
    pub id: String,
    pub path: PathBuf,
    workspace: PathBuf,
}

/// Runs a shell invocation (after `${id}` expansion) and captures its
/// stdout into `{id}_output.txt` in the workspace.
#[derive(Debug, Clone)]
pub struct RunScriptNode {
    pub id: String,
    pub command: String,
    workspace: PathBuf,
}

/// Copies an upstream node's output file to a literal destination path.
#[derive(Debug, Clone)]
pub struct WriteFileNode {
    pub id: String,
    pub input: String,
    pub output: PathBuf,
}

/// A single pipeline step.
///
/// Nodes are immutable after construction; all required fields are checked
/// once, when the raw step mapping is destructured into the variant's
/// parameter record.
#[derive(Debug, Clone)]
pub enum Node {
    ReadFile(ReadFileNode),
    RunScript(RunScriptNode),
    WriteFile(WriteFileNode),
}

/// Resolve a program token the way the shell will: literal paths are
/// checked directly, bare names are searched on PATH.
fn program_exists(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).exists();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

fn str_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(&Value::String(key.to_string()))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn require_field(
    map: &Mapping,
    kind: &'static str,
    node_id: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    str_field(map, field).ok_or_else(|| ValidationError::MissingField {
        kind,
        node_id: node_id.to_string(),
        field,
    })
}

impl Node {
    /// Construct a node from a raw step mapping.
    ///
    /// Identity fields (`node`, `id`) and the variant's required parameters
    /// are checked here, so a constructed node can only fail validation on
    /// environmental grounds (missing files, unknown upstream ids).
    pub fn from_mapping(map: &Mapping, workspace: &Path) -> Result<Self, ValidationError> {
        let kind_str = str_field(map, "node").ok_or(ValidationError::MissingIdentity("node"))?;
        let id = str_field(map, "id").ok_or(ValidationError::MissingIdentity("id"))?;

        let kind = NodeKind::parse(&kind_str)
            .ok_or_else(|| ValidationError::UnknownKind(kind_str.clone()))?;

        let node = match kind {
            NodeKind::ReadFile => Node::ReadFile(ReadFileNode {
                path: require_field(map, "ReadFile", &id, "path")?.into(),
                id,
                workspace: workspace.to_path_buf(),
            }),
            NodeKind::RunScript => Node::RunScript(RunScriptNode {
                command: require_field(map, "RunScript", &id, "path")?,
                id,
                workspace: workspace.to_path_buf(),
            }),
            NodeKind::WriteFile => Node::WriteFile(WriteFileNode {
                input: require_field(map, "WriteFile", &id, "input")?,
                output: require_field(map, "WriteFile", &id, "output")?.into(),
                id,
            }),
        };

        Ok(node)
    }

    /// Unique step identifier
    pub fn id(&self) -> &str {
        match self {
            Node::ReadFile(n) => &n.id,
            Node::RunScript(n) => &n.id,
            Node::WriteFile(n) => &n.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::ReadFile(_) => NodeKind::ReadFile,
            Node::RunScript(_) => NodeKind::RunScript,
            Node::WriteFile(_) => NodeKind::WriteFile,
        }
    }

    /// One-line description for summary output
    pub fn describe(&self) -> String {
        match self {
            Node::ReadFile(n) => format!("Read: {}", n.path.display()),
            Node::RunScript(n) => format!("Run: {}", n.command),
            Node::WriteFile(n) => format!("Write to: {}", n.output.display()),
        }
    }

    /// Check the node against the outputs recorded so far.
    ///
    /// Called once at load time with an empty registry (structural errors
    /// only) and again immediately before the node executes, when the
    /// registry reflects every upstream step that has already run.
    pub fn validate(&self, outputs: &OutputRegistry) -> Result<(), ValidationError> {
        match self {
            Node::ReadFile(n) => n.validate(),
            Node::RunScript(n) => n.validate(outputs),
            Node::WriteFile(n) => n.validate(outputs),
        }
    }

    /// Perform the node's side effect and return the produced file path.
    pub async fn execute(
        &self,
        outputs: &OutputRegistry,
        shell: &dyn CommandRunner,
    ) -> Result<PathBuf, ExecutionError> {
        match self {
            Node::ReadFile(n) => n.execute().await,
            Node::RunScript(n) => n.execute(outputs, shell).await,
            Node::WriteFile(n) => n.execute(outputs).await,
        }
    }
}

impl ReadFileNode {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.path.exists() {
            return Err(ValidationError::FileNotFound {
                node_id: self.id.clone(),
                path: self.path.clone(),
            });
        }
        if !self.path.is_file() {
            return Err(ValidationError::NotAFile {
                node_id: self.id.clone(),
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    async fn execute(&self) -> Result<PathBuf, ExecutionError> {
        let name = self.path.file_name().ok_or_else(|| ExecutionError::Io {
            node_id: self.id.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "source path has no file name"),
        })?;

        let dest = self
            .workspace
            .join(format!("{}_{}", self.id, name.to_string_lossy()));

        debug!("copying {} -> {}", self.path.display(), dest.display());
        tokio::fs::copy(&self.path, &dest)
            .await
            .map_err(|source| ExecutionError::Copy {
                node_id: self.id.clone(),
                dest: dest.clone(),
                source,
            })?;

        Ok(dest)
    }
}

impl RunScriptNode {
    fn validate(&self, outputs: &OutputRegistry) -> Result<(), ValidationError> {
        let expanded = expand_variables(&self.command, outputs);
        // Only the program token is checked; arguments may be anything.
        if let Some(program) = expanded.split_whitespace().next() {
            if !program_exists(program) {
                return Err(ValidationError::FileNotFound {
                    node_id: self.id.clone(),
                    path: PathBuf::from(program),
                });
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        outputs: &OutputRegistry,
        shell: &dyn CommandRunner,
    ) -> Result<PathBuf, ExecutionError> {
        let command = expand_variables(&self.command, outputs);
        let output_path = self.workspace.join(format!("{}_output.txt", self.id));

        debug!("running `{}` for node {}", command, self.id);
        let result = shell
            .run(&command)
            .await
            .map_err(|source| ExecutionError::Io {
                node_id: self.id.clone(),
                source,
            })?;

        tokio::fs::write(&output_path, &result.stdout)
            .await
            .map_err(|source| ExecutionError::Io {
                node_id: self.id.clone(),
                source,
            })?;

        if result.code != 0 {
            return Err(ExecutionError::NonZeroExit {
                node_id: self.id.clone(),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(output_path)
    }
}

impl WriteFileNode {
    fn validate(&self, outputs: &OutputRegistry) -> Result<(), ValidationError> {
        // An empty registry means the load-time pass: declaration order is
        // not enforced at parse time, only right before execution.
        if !outputs.is_empty() && !outputs.contains(&self.input) {
            return Err(ValidationError::UpstreamMissing {
                node_id: self.id.clone(),
                input: self.input.clone(),
            });
        }

        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    ValidationError::OutputDirCreate {
                        node_id: self.id.clone(),
                        dir: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        Ok(())
    }

    async fn execute(&self, outputs: &OutputRegistry) -> Result<PathBuf, ExecutionError> {
        let input_path = outputs.get(&self.input).ok_or_else(|| ExecutionError::Io {
            node_id: self.id.clone(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("no recorded output for upstream node '{}'", self.input),
            ),
        })?;

        debug!("copying {} -> {}", input_path.display(), self.output.display());
        tokio::fs::copy(input_path, &self.output)
            .await
            .map_err(|source| ExecutionError::Copy {
                node_id: self.id.clone(),
                dest: self.output.clone(),
                source,
            })?;

        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::shell::SystemShell;

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (Value::String(k.to_string()), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_factory_builds_each_kind() {
        let ws = Path::new("/tmp/ws");

        let read = Node::from_mapping(
            &mapping(&[("node", "readfile"), ("id", "r"), ("path", "/tmp/a.txt")]),
            ws,
        )
        .unwrap();
        assert_eq!(read.kind(), NodeKind::ReadFile);
        assert_eq!(read.id(), "r");

        let run = Node::from_mapping(
            &mapping(&[("node", "runscript"), ("id", "s"), ("path", "cat ${r}")]),
            ws,
        )
        .unwrap();
        assert_eq!(run.kind(), NodeKind::RunScript);

        let write = Node::from_mapping(
            &mapping(&[
                ("node", "writefile"),
                ("id", "w"),
                ("input", "s"),
                ("output", "/tmp/out.txt"),
            ]),
            ws,
        )
        .unwrap();
        assert_eq!(write.kind(), NodeKind::WriteFile);
    }

    #[test]
    fn test_factory_kind_is_case_insensitive() {
        let node = Node::from_mapping(
            &mapping(&[("node", "ReadFile"), ("id", "r"), ("path", "/tmp/a.txt")]),
            Path::new("/tmp/ws"),
        )
        .unwrap();
        assert_eq!(node.kind(), NodeKind::ReadFile);
    }

    #[test]
    fn test_factory_rejects_unknown_kind() {
        let err = Node::from_mapping(
            &mapping(&[("node", "httpgetfile"), ("id", "x")]),
            Path::new("/tmp/ws"),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownKind(k) if k == "httpgetfile"));
    }

    #[test]
    fn test_factory_rejects_missing_identity() {
        let err =
            Node::from_mapping(&mapping(&[("id", "x")]), Path::new("/tmp/ws")).unwrap_err();
        assert!(matches!(err, ValidationError::MissingIdentity("node")));

        let err =
            Node::from_mapping(&mapping(&[("node", "readfile")]), Path::new("/tmp/ws"))
                .unwrap_err();
        assert!(matches!(err, ValidationError::MissingIdentity("id")));
    }

    #[test]
    fn test_factory_rejects_missing_variant_fields() {
        let err = Node::from_mapping(
            &mapping(&[("node", "readfile"), ("id", "r")]),
            Path::new("/tmp/ws"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "path", .. }
        ));

        let err = Node::from_mapping(
            &mapping(&[("node", "writefile"), ("id", "w"), ("input", "r")]),
            Path::new("/tmp/ws"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "output", .. }
        ));
    }

    #[test]
    fn test_readfile_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "readfile"),
                ("id", "r"),
                ("path", "/tmp/definitely_missing_9f2a.txt"),
            ]),
            dir.path(),
        )
        .unwrap();

        let err = node.validate(&OutputRegistry::new()).unwrap_err();
        assert!(matches!(err, ValidationError::FileNotFound { .. }));
    }

    #[test]
    fn test_readfile_validate_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path_s = dir.path().to_string_lossy().to_string();
        let node = Node::from_mapping(
            &mapping(&[("node", "readfile"), ("id", "r"), ("path", &path_s)]),
            dir.path(),
        )
        .unwrap();

        let err = node.validate(&OutputRegistry::new()).unwrap_err();
        assert!(matches!(err, ValidationError::NotAFile { .. }));
    }

    #[test]
    fn test_runscript_validate_resolves_program_on_path() {
        let node = Node::from_mapping(
            &mapping(&[("node", "runscript"), ("id", "s"), ("path", "cat ${input}")]),
            Path::new("/tmp/ws"),
        )
        .unwrap();
        node.validate(&OutputRegistry::new()).unwrap();
    }

    #[test]
    fn test_runscript_validate_missing_program() {
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "runscript"),
                ("id", "s"),
                ("path", "/nonexistent/bin/frobnicate input.txt"),
            ]),
            Path::new("/tmp/ws"),
        )
        .unwrap();
        let err = node.validate(&OutputRegistry::new()).unwrap_err();
        assert!(matches!(err, ValidationError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_readfile_execute_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("data.txt");
        std::fs::write(&src, "test data").unwrap();

        let src_s = src.to_string_lossy().to_string();
        let node = Node::from_mapping(
            &mapping(&[("node", "readfile"), ("id", "input"), ("path", &src_s)]),
            dir.path(),
        )
        .unwrap();

        let out = node
            .execute(&OutputRegistry::new(), &SystemShell::new())
            .await
            .unwrap();

        assert_eq!(out, dir.path().join("input_data.txt"));
        assert_eq!(std::fs::read_to_string(out).unwrap(), "test data");
    }

    #[test]
    fn test_writefile_validate_tolerates_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let out_s = out.to_string_lossy().to_string();
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "writefile"),
                ("id", "w"),
                ("input", "later_step"),
                ("output", &out_s),
            ]),
            dir.path(),
        )
        .unwrap();

        // Load-time pass: upstream not produced yet, still fine.
        node.validate(&OutputRegistry::new()).unwrap();

        // Pre-execute pass with a populated registry that lacks the input.
        let outputs: OutputRegistry = [("other", "/tmp/x")].into_iter().collect();
        let err = node.validate(&outputs).unwrap_err();
        assert!(matches!(err, ValidationError::UpstreamMissing { input, .. } if input == "later_step"));
    }

    #[test]
    fn test_writefile_validate_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/out.txt");
        let out_s = out.to_string_lossy().to_string();
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "writefile"),
                ("id", "w"),
                ("input", "r"),
                ("output", &out_s),
            ]),
            dir.path(),
        )
        .unwrap();

        node.validate(&OutputRegistry::new()).unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }

    #[tokio::test]
    async fn test_writefile_execute_copies_upstream_output() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = dir.path().join("r_output.txt");
        std::fs::write(&upstream, "payload").unwrap();
        let dest = dir.path().join("final.txt");

        let dest_s = dest.to_string_lossy().to_string();
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "writefile"),
                ("id", "w"),
                ("input", "r"),
                ("output", &dest_s),
            ]),
            dir.path(),
        )
        .unwrap();

        let outputs: OutputRegistry = [("r", &upstream)].into_iter().collect();
        let out = node
            .execute(&outputs, &SystemShell::new())
            .await
            .unwrap();

        assert_eq!(out, dest);
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_runscript_execute_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("hello.txt");
        std::fs::write(&src, "hello pipeline").unwrap();

        let node = Node::from_mapping(
            &mapping(&[("node", "runscript"), ("id", "proc"), ("path", "cat ${in}")]),
            dir.path(),
        )
        .unwrap();

        let outputs: OutputRegistry = [("in", &src)].into_iter().collect();
        let out = node
            .execute(&outputs, &SystemShell::new())
            .await
            .unwrap();

        assert_eq!(out, dir.path().join("proc_output.txt"));
        assert_eq!(std::fs::read_to_string(out).unwrap(), "hello pipeline");
    }

    #[tokio::test]
    async fn test_runscript_nonzero_exit_reports_code_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::from_mapping(
            &mapping(&[
                ("node", "runscript"),
                ("id", "bad"),
                ("path", "sh -c 'echo oops >&2; exit 2'"),
            ]),
            dir.path(),
        )
        .unwrap();

        let err = node
            .execute(&OutputRegistry::new(), &SystemShell::new())
            .await
            .unwrap_err();

        match err {
            ExecutionError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, 2);
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }
}
