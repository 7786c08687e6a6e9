//! Application container for agodoc

use std::sync::Arc;

use crate::config::LaunchConfig;
use crate::error::AgodocResult;
use crate::infra::offset::byte_offset;
use crate::models::config::AgodocConfig;
use crate::models::symbol::LookupKey;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::editor::{AcmeEditorService, EditorService};
use crate::services::import_path::ImportPathFinder;
use crate::services::loader::load_program;
use crate::services::resolve::{classify, resolve};
use crate::services::viewer::{DefaultViewerService, ViewerService};

pub struct App {
    pub(crate) editor: Arc<dyn EditorService>,
    pub(crate) viewer: Arc<dyn ViewerService>,
    pub(crate) import_paths: ImportPathFinder,
    pub(crate) config: AgodocConfig,
}

impl App {
    pub async fn new() -> AgodocResult<Self> {
        let config_service = DefaultConfigService::default();
        let config = config_service.load().await?;
        tracing::debug!("Config from {}", config_service.config_path().display());

        let editor = Arc::new(AcmeEditorService::from_config(&config.editor));
        let viewer = Arc::new(DefaultViewerService::new(&config.viewer));
        Ok(Self::with_services(
            config,
            editor,
            viewer,
            ImportPathFinder::from_env(),
        ))
    }

    pub fn with_services(
        config: AgodocConfig,
        editor: Arc<dyn EditorService>,
        viewer: Arc<dyn ViewerService>,
        import_paths: ImportPathFinder,
    ) -> Self {
        Self {
            editor,
            viewer,
            import_paths,
            config,
        }
    }

    /// Documentation key for the identifier under the cursor.
    pub async fn lookup(&self, launch: &LaunchConfig) -> AgodocResult<LookupKey> {
        let window = self.editor.read_window(launch.winid).await?;
        let offset = byte_offset(window.body.chars(), window.selection.start)?;

        let program = load_program(&launch.cwd, &window.file_name, window.body).await?;
        let symbol = resolve(&program, offset)?;
        tracing::debug!("Resolved {:?}", symbol);

        // Only local symbols are keyed by the edited package's import path.
        let import_path = if symbol.is_local() {
            self.import_paths.import_path(&launch.cwd).await?
        } else {
            String::new()
        };
        Ok(classify(&symbol, &import_path, &self.config.resolve)?)
    }

    /// Look up the identifier under the cursor and show its documentation.
    pub async fn run(&self, launch: &LaunchConfig) -> AgodocResult<()> {
        let key = self.lookup(launch).await?;
        tracing::info!("Showing {}", key);
        self.viewer.show(&key).await?;
        Ok(())
    }
}
