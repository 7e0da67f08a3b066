// void-core/src/install/post_install.rs
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

/// Result of one post-install snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub command: String,
    pub success: bool,
}

/// Substitutes `{bin}` and `{link}` in a post-install snippet.
pub fn render_script(script: &str, binary: &Path, link_name: &str) -> String {
    script
        .replace("{bin}", &binary.display().to_string())
        .replace("{link}", link_name)
}

/// Runs each snippet with `sh -c` inside `install_dir`. Failures are logged, never raised.
pub fn run_post_install_scripts(
    scripts: &[String],
    install_dir: &Path,
    binary: &Path,
    link_name: &str,
) -> Vec<ScriptOutcome> {
    scripts
        .iter()
        .map(|script| {
            let command = render_script(script, binary, link_name);
            debug!("Running post-install script: {}", command);
            let success = match Command::new("sh")
                .arg("-c")
                .arg(&command)
                .current_dir(install_dir)
                .output()
            {
                Ok(output) if output.status.success() => true,
                Ok(output) => {
                    warn!(
                        "Post-install script '{}' exited with {}: {}",
                        command,
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                    false
                }
                Err(e) => {
                    warn!("Failed to run post-install script '{}': {}", command, e);
                    false
                }
            };
            ScriptOutcome { command, success }
        })
        .collect()
}
