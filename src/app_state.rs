use crate::Config;
use crate::model::ModelClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const UPLOADS_DIR: &str = "uploads";

fn init_workspace(workspace: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(workspace.join(UPLOADS_DIR))?;
    Ok(())
}

/// Process-wide state, built once from [`Config`] and shared read-only by
/// every request.
#[derive(Clone)]
pub struct AppState {
    pub model: Option<ModelClient>,
    pub api_key: Option<Arc<str>>,
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let workspace = config.workspace_path();
        init_workspace(&workspace)?;

        let model = match &config.model_api_url {
            Some(url) => {
                info!(url, timeout_secs = config.model_timeout_secs, "Forwarding predictions to model endpoint");
                Some(ModelClient::new(url.clone(), config.model_timeout())?)
            }
            None => {
                info!("No model endpoint configured, using fallback predictions");
                None
            }
        };

        if config.api_key.is_some() {
            info!("X-API-KEY required on prediction requests");
        }

        Ok(Self {
            model,
            api_key: config.api_key.as_deref().map(Arc::from),
            uploads_dir: workspace.join(UPLOADS_DIR),
        })
    }

    pub fn uploads_dir(&self) -> &Path {
        self.uploads_dir.as_path()
    }

    /// `"proxy"` when an external model is configured, `"fallback"` otherwise.
    pub fn mode(&self) -> &'static str {
        if self.model.is_some() { "proxy" } else { "fallback" }
    }
}
