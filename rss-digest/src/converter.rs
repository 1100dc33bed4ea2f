use interfaces::{ConvertError, ConvertOptions, DocumentConverter};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Converts the composed HTML by piping it through `pandoc`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl PandocConverter {
    pub fn new() -> Self {
        Self::with_program("pandoc")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(
        &self,
        document: &str,
        format: &str,
        destination: &Path,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError> {
        let args = pandoc_args(format, destination, options);
        debug!("Running {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A converter that exits early closes its end; its exit status
            // tells the real story.
            if let Err(e) = stdin.write_all(document.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Command line for one conversion. PDF has no writer of its own in pandoc;
/// it is chosen from the output file name.
pub fn pandoc_args(format: &str, destination: &Path, options: &ConvertOptions) -> Vec<String> {
    let mut args = vec!["-f".to_string(), "html".to_string()];

    if format != "pdf" {
        args.push("-t".to_string());
        args.push(format.to_string());
    }

    args.push("-o".to_string());
    args.push(destination.display().to_string());

    if options.table_of_contents {
        args.push("--toc".to_string());
    }
    if let Some(title) = &options.title {
        args.push("-V".to_string());
        args.push(format!("title={}", title));
    }
    if !options.date.is_empty() {
        args.push("-M".to_string());
        args.push(format!("date={}", options.date));
    }
    if let Some(metadata) = &options.metadata_file {
        args.push(format!("--metadata-file={}", metadata.display()));
    }
    if let Some(defaults) = &options.defaults_file {
        args.push(format!("--defaults={}", defaults.display()));
    }
    for transform in &options.transforms {
        let flag = match transform.extension().and_then(|e| e.to_str()) {
            Some("lua") => "--lua-filter",
            _ => "--filter",
        };
        args.push(format!("{}={}", flag, transform.display()));
    }

    args.extend(options.extra_flags.iter().cloned());
    args
}
