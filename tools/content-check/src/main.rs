mod lint;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ivory_domain::{decode_content, ContentFormat};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lint::{lint, Severity};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check lesson, exam and quiz files for mistakes"
)]
struct Args {
    /// Content files (JSON or YAML)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Treat warnings as errors
    #[arg(long)]
    deny_warnings: bool,
    /// Print findings as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut failed = 0usize;
    for path in &args.inputs {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let content = match decode_content(&bytes, ContentFormat::from_path(path)) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not decode content");
                println!("{}: error: {err}", path.display());
                failed += 1;
                continue;
            }
        };
        let findings = lint(&content);
        info!(
            path = %path.display(),
            kind = ?content.kind(),
            findings = findings.len(),
            "checked content"
        );
        for finding in &findings {
            if args.json {
                println!("{}", serde_json::to_string(finding)?);
            } else {
                println!("{}: {finding}", path.display());
            }
        }
        let blocking = findings.iter().any(|finding| {
            finding.severity == Severity::Error
                || (args.deny_warnings && finding.severity == Severity::Warning)
        });
        if blocking {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed the check", args.inputs.len());
    }
    println!("Checked {} files", args.inputs.len());
    Ok(())
}
