use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TransdocError};

/// External conversion command ready to run
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub timeout: Duration,
}

impl ConvertCommand {
    /// Create a new conversion command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion. The child is killed if it outlives the timeout or
    /// if the returned future is dropped.
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing converter command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                TransdocError::Conversion(format!(
                    "{} timed out after {}s",
                    self.description,
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| {
                TransdocError::Conversion(format!(
                    "Failed to execute {}: {}",
                    self.binary_path, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransdocError::Conversion(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Builder for converter invocations
pub struct ConvertCommandBuilder {
    binary_path: String,
    timeout: Duration,
}

impl ConvertCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
        }
    }

    /// Headless LibreOffice PDF import into a DOCX under `out_dir`.
    /// A private user profile keeps it independent of any running instance.
    pub fn office_pdf_to_docx<P: AsRef<Path>>(&self, input: P, out_dir: P) -> ConvertCommand {
        let profile = out_dir.as_ref().join(".profile");
        ConvertCommand::new(&self.binary_path, "PDF to DOCX conversion")
            .timeout(self.timeout)
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .arg("--headless")
            .arg("--infilter=writer_pdf_import")
            .arg("--convert-to")
            .arg("docx")
            .arg("--outdir")
            .path(out_dir)
            .path(input)
    }

    /// Substitute `{input}`, `{output}` and `{outdir}` into a user template
    pub fn from_template<P: AsRef<Path>>(
        &self,
        template: &[String],
        input: P,
        output: P,
        out_dir: P,
    ) -> ConvertCommand {
        let input = input.as_ref().to_string_lossy().to_string();
        let output = output.as_ref().to_string_lossy().to_string();
        let out_dir = out_dir.as_ref().to_string_lossy().to_string();

        ConvertCommand::new(&self.binary_path, "PDF to DOCX conversion")
            .timeout(self.timeout)
            .args(template.iter().map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{outdir}", &out_dir)
            }))
    }

    /// Build version check command
    pub fn version_check(&self) -> ConvertCommand {
        ConvertCommand::new(&self.binary_path, "Version check")
            .timeout(self.timeout)
            .arg("--version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_template_substitution() {
        let builder = ConvertCommandBuilder::new("pdf2docx", Duration::from_secs(5));
        let template = vec![
            "convert".to_string(),
            "{input}".to_string(),
            "{output}".to_string(),
            "--dir={outdir}".to_string(),
        ];
        let cmd = builder.from_template(
            &template,
            PathBuf::from("/in/a.pdf"),
            PathBuf::from("/tmp/x/a.docx"),
            PathBuf::from("/tmp/x"),
        );
        assert_eq!(cmd.binary_path, "pdf2docx");
        assert_eq!(cmd.args, vec!["convert", "/in/a.pdf", "/tmp/x/a.docx", "--dir=/tmp/x"]);
        assert_eq!(cmd.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_office_arguments() {
        let builder = ConvertCommandBuilder::new("soffice", Duration::from_secs(60));
        let cmd = builder.office_pdf_to_docx(PathBuf::from("/docs/r.pdf"), PathBuf::from("/tmp/w"));
        assert!(cmd.args.contains(&"--headless".to_string()));
        assert_eq!(cmd.args.last().map(String::as_str), Some("/docs/r.pdf"));
        assert_eq!(cmd.args[0], "-env:UserInstallation=file:///tmp/w/.profile");
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let cmd = ConvertCommand::new("transdoc-no-such-converter", "probe");
        assert!(matches!(cmd.execute().await, Err(TransdocError::Conversion(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_conversion_error() {
        let cmd = ConvertCommand::new("sh", "failing step").arg("-c").arg("echo broken >&2; exit 3");
        match cmd.execute().await {
            Err(TransdocError::Conversion(msg)) => assert!(msg.contains("broken")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_converter() {
        let cmd = ConvertCommand::new("sleep", "slow step")
            .arg("5")
            .timeout(Duration::from_millis(200));
        match cmd.execute().await {
            Err(TransdocError::Conversion(msg)) => assert!(msg.contains("timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
