//! Preview lifecycle: port allocation, preview materialisation and the
//! serving subprocess.
//!
//! Generated projects are Flask apps, so the preview is served by a
//! synthesized Flask shim launched as an independent OS process. The
//! manager owns the port/binding table; a project keeps its binding for
//! its lifetime and two projects never share a port concurrently.

use std::collections::{HashMap, HashSet};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BuildError, BuildResult};

/// Name of the synthesized serving shim inside the preview directory.
pub const SHIM_FILE: &str = "preview_app.py";

/// The port the shim is written with before patching.
const SHIM_DEFAULT_PORT: &str = "port=5000";

/// Tunables for the preview lifecycle.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Preferred port range for previews.
    pub port_range: std::ops::RangeInclusive<u16>,
    /// Wider range scanned when the preferred range is exhausted.
    pub fallback_range: std::ops::Range<u16>,
    /// Readiness poll attempts before giving up.
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    /// Timeout of each readiness probe.
    pub probe_timeout: Duration,
    /// Directory removal retries before a cleanup error is fatal.
    pub cleanup_retries: u32,
    pub cleanup_backoff: Duration,
    /// Interpreter used to run the shim.
    pub python_bin: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port_range: 3001..=3010,
            fallback_range: 8000..9000,
            poll_attempts: 15,
            poll_interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(3),
            cleanup_retries: 3,
            cleanup_backoff: Duration::from_millis(500),
            python_bin: "python".to_string(),
        }
    }
}

/// Lifecycle state of a preview binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Starting,
    Ready,
    Failed,
}

/// A live port/process association for one project.
#[derive(Debug)]
pub struct PreviewBinding {
    pub port: u16,
    pub state: PreviewState,
    child: Option<Child>,
}

/// Owns preview bindings and the port table.
pub struct PreviewManager {
    config: PreviewConfig,
    bindings: Mutex<HashMap<String, PreviewBinding>>,
}

impl PreviewManager {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the preview URL for a project. An existing READY
    /// binding is reused without re-spawning.
    pub async fn preview_url(
        &self,
        project_id: &str,
        preview_dir: &Path,
    ) -> BuildResult<String> {
        let port = {
            let mut bindings = self.bindings.lock().await;

            if let Some(binding) = bindings.get(project_id) {
                if binding.state == PreviewState::Ready {
                    debug!(
                        "Reusing preview binding for {} on port {}",
                        project_id, binding.port
                    );
                    return Ok(preview_url_for(binding.port));
                }
            }

            let assigned: HashSet<u16> = bindings.values().map(|b| b.port).collect();
            let port = self.allocate_port(&assigned)?;

            patch_shim_port(preview_dir, port)?;
            let child = self.spawn_shim(preview_dir)?;
            info!("Starting preview server for {} on port {}", project_id, port);

            bindings.insert(
                project_id.to_string(),
                PreviewBinding {
                    port,
                    state: PreviewState::Starting,
                    child: Some(child),
                },
            );
            port
        };

        if self.wait_until_ready(port).await {
            let mut bindings = self.bindings.lock().await;
            if let Some(binding) = bindings.get_mut(project_id) {
                binding.state = PreviewState::Ready;
            }
            info!("Preview server ready on port {}", port);
            Ok(preview_url_for(port))
        } else {
            let mut bindings = self.bindings.lock().await;
            if let Some(mut binding) = bindings.remove(project_id) {
                binding.state = PreviewState::Failed;
                if let Some(mut child) = binding.child.take() {
                    let _ = child.kill().await;
                }
            }
            warn!("Preview server failed to start on port {}", port);
            Err(BuildError::PreviewNotReady { port })
        }
    }

    /// Find a port that is neither in the binding table nor actually bound
    /// by anyone else. The table is advisory; bindability is re-checked at
    /// assignment time because external processes may hold a port.
    pub fn allocate_port(&self, assigned: &HashSet<u16>) -> BuildResult<u16> {
        for port in self
            .config
            .port_range
            .clone()
            .chain(self.config.fallback_range.clone())
        {
            if !assigned.contains(&port) && port_is_free(port) {
                debug!("Allocated preview port {}", port);
                return Ok(port);
            }
        }

        // Last resort: let the OS pick an ephemeral port.
        let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|_| BuildError::NoFreePort)?;
        let port = listener
            .local_addr()
            .map_err(|_| BuildError::NoFreePort)?
            .port();
        debug!("Allocated ephemeral preview port {}", port);
        Ok(port)
    }

    /// Replace the preview directory with a fresh copy of the generated
    /// source tree plus the serving shim.
    pub async fn materialize(&self, src_dir: &Path, preview_dir: &Path) -> BuildResult<()> {
        self.clean_directory(preview_dir).await?;
        std::fs::create_dir_all(preview_dir)?;

        if src_dir.exists() {
            let mut options = fs_extra::dir::CopyOptions::new();
            options.content_only = true;
            options.overwrite = true;
            fs_extra::dir::copy(src_dir, preview_dir, &options)?;
        }

        std::fs::write(preview_dir.join(SHIM_FILE), FLASK_SHIM)?;
        debug!("Materialized preview at {}", preview_dir.display());
        Ok(())
    }

    /// Remove a directory tree, retrying with backoff before surfacing a
    /// fatal cleanup error.
    pub async fn clean_directory(&self, path: &Path) -> BuildResult<()> {
        if !path.exists() {
            return Ok(());
        }

        let mut attempt = 0;
        loop {
            match std::fs::remove_dir_all(path) {
                Ok(()) => {
                    debug!("Cleaned directory {}", path.display());
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.cleanup_retries {
                        return Err(BuildError::Cleanup {
                            path: path.to_path_buf(),
                            source: e,
                        });
                    }
                    warn!(
                        "Clean attempt {} for {} failed, retrying: {}",
                        attempt,
                        path.display(),
                        e
                    );
                    tokio::time::sleep(self.config.cleanup_backoff).await;
                }
            }
        }
    }

    fn spawn_shim(&self, preview_dir: &Path) -> BuildResult<Child> {
        let child = Command::new(&self.config.python_bin)
            .arg(SHIM_FILE)
            .current_dir(preview_dir)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;
        Ok(child)
    }

    /// Poll the port until the shim answers. A 200 or a 404 both mean the
    /// process is alive and accepting connections.
    async fn wait_until_ready(&self, port: u16) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(self.config.probe_timeout)
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };

        let url = preview_url_for(port);
        for attempt in 0..self.config.poll_attempts {
            match client.get(&url).send().await {
                Ok(response)
                    if response.status().is_success() || response.status().as_u16() == 404 =>
                {
                    debug!("Preview ready after {} attempts", attempt + 1);
                    return true;
                }
                Ok(_) | Err(_) => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
        false
    }
}

fn preview_url_for(port: u16) -> String {
    format!("http://localhost:{}", port)
}

fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Rewrite the shim's listening port. A missing shim is synthesized first,
/// so a preview request always has something to run.
fn patch_shim_port(preview_dir: &Path, port: u16) -> BuildResult<()> {
    let shim_path = preview_dir.join(SHIM_FILE);
    if !shim_path.exists() {
        std::fs::create_dir_all(preview_dir)?;
        std::fs::write(&shim_path, FLASK_SHIM)?;
    }

    let content = std::fs::read_to_string(&shim_path)?;
    let patched = if content.contains(SHIM_DEFAULT_PORT) {
        content.replace(SHIM_DEFAULT_PORT, &format!("port={}", port))
    } else {
        // A previous run already patched it; rewrite from the template.
        FLASK_SHIM.replace(SHIM_DEFAULT_PORT, &format!("port={}", port))
    };
    std::fs::write(&shim_path, patched)?;
    Ok(())
}

/// Minimal Flask shim: renders the generated entry template when present,
/// serves a literal entry file otherwise, falls back to a placeholder page,
/// and exposes static assets plus a catch-all page route.
const FLASK_SHIM: &str = r#""""
Preview server for a generated project.
"""
import os
from flask import Flask, render_template, send_from_directory

app = Flask(
    __name__,
    template_folder='templates' if os.path.exists('templates') else '.',
    static_folder='static' if os.path.exists('static') else None,
)


@app.route('/static/<path:filename>')
def serve_static(filename):
    return send_from_directory('static', filename)


@app.route('/')
def index():
    try:
        if os.path.exists('templates/index.html'):
            return render_template('index.html')
        elif os.path.exists('index.html'):
            with open('index.html', 'r', encoding='utf-8') as f:
                return f.read()
        else:
            return "<h1>Preview Server Running</h1><p>No index.html found</p>"
    except Exception as e:
        return f"<h1>Error rendering template</h1><p>{str(e)}</p>"


@app.route('/<path:page>')
def serve_page(page):
    try:
        if page.endswith('.html'):
            template_name = page[:-5]
            if os.path.exists(f'templates/{template_name}.html'):
                return render_template(f'{template_name}.html')
            elif os.path.exists(page):
                with open(page, 'r', encoding='utf-8') as f:
                    return f.read()
        return "Page not found", 404
    except Exception as e:
        return f"Error serving page: {str(e)}", 500


if __name__ == '__main__':
    app.run(debug=False, host='0.0.0.0', port=5000)
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn allocator_skips_ports_already_in_the_table() {
        let manager = PreviewManager::new(PreviewConfig {
            port_range: 3101..=3102,
            fallback_range: 0..0,
            ..PreviewConfig::default()
        });

        // Simulate another project owning 3101.
        let assigned = HashSet::from([3101u16]);
        let port = manager.allocate_port(&assigned).unwrap();
        assert_ne!(port, 3101);
    }

    #[test]
    fn allocator_skips_ports_held_by_external_processes() {
        // Hold a port so the table check alone would not catch it.
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let held_port = held.local_addr().unwrap().port();

        let manager = PreviewManager::new(PreviewConfig {
            port_range: held_port..=held_port,
            fallback_range: 0..0,
            ..PreviewConfig::default()
        });

        let port = manager.allocate_port(&HashSet::new()).unwrap();
        assert_ne!(port, held_port);
    }

    #[test]
    fn exhausted_ranges_fall_back_to_an_ephemeral_port() {
        let manager = PreviewManager::new(PreviewConfig {
            port_range: 1..=0, // empty
            fallback_range: 0..0,
            ..PreviewConfig::default()
        });
        let port = manager.allocate_port(&HashSet::new()).unwrap();
        assert!(port > 0);
    }

    #[tokio::test]
    async fn materialize_copies_sources_and_writes_the_shim() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let preview = temp.path().join("preview");
        std::fs::create_dir_all(src.join("templates")).unwrap();
        std::fs::write(src.join("app.py"), "from flask import Flask").unwrap();
        std::fs::write(src.join("templates/index.html"), "<html></html>").unwrap();

        let manager = PreviewManager::new(PreviewConfig::default());
        manager.materialize(&src, &preview).await.unwrap();

        assert!(preview.join("app.py").exists());
        assert!(preview.join("templates/index.html").exists());
        let shim = std::fs::read_to_string(preview.join(SHIM_FILE)).unwrap();
        assert!(shim.contains("render_template('index.html')"));
        assert!(shim.contains("port=5000"));
    }

    #[tokio::test]
    async fn materialize_replaces_a_previous_preview() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let preview = temp.path().join("preview");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&preview).unwrap();
        std::fs::write(preview.join("stale.txt"), "old run").unwrap();
        std::fs::write(src.join("app.py"), "new run").unwrap();

        let manager = PreviewManager::new(PreviewConfig::default());
        manager.materialize(&src, &preview).await.unwrap();

        assert!(!preview.join("stale.txt").exists());
        assert!(preview.join("app.py").exists());
    }

    #[test]
    fn shim_port_is_patched_in_place() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(SHIM_FILE), FLASK_SHIM).unwrap();

        patch_shim_port(temp.path(), 3007).unwrap();

        let shim = std::fs::read_to_string(temp.path().join(SHIM_FILE)).unwrap();
        assert!(shim.contains("port=3007"));
        assert!(!shim.contains("port=5000"));
    }

    #[test]
    fn repatching_an_already_patched_shim_still_works() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(SHIM_FILE), FLASK_SHIM).unwrap();

        patch_shim_port(temp.path(), 3007).unwrap();
        patch_shim_port(temp.path(), 8042).unwrap();

        let shim = std::fs::read_to_string(temp.path().join(SHIM_FILE)).unwrap();
        assert!(shim.contains("port=8042"));
        assert!(!shim.contains("port=3007"));
    }

    #[test]
    fn missing_shim_is_synthesized_before_patching() {
        let temp = tempdir().unwrap();
        patch_shim_port(temp.path(), 3003).unwrap();
        let shim = std::fs::read_to_string(temp.path().join(SHIM_FILE)).unwrap();
        assert!(shim.contains("port=3003"));
    }

    #[tokio::test]
    async fn cleaning_a_missing_directory_is_a_no_op() {
        let temp = tempdir().unwrap();
        let manager = PreviewManager::new(PreviewConfig::default());
        manager
            .clean_directory(&temp.path().join("nothing-here"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cleaning_removes_nested_trees() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("preview");
        std::fs::create_dir_all(target.join("static/css")).unwrap();
        std::fs::write(target.join("static/css/style.css"), "body{}").unwrap();

        let manager = PreviewManager::new(PreviewConfig::default());
        manager.clean_directory(&target).await.unwrap();
        assert!(!target.exists());
    }
}
