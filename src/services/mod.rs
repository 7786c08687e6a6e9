//! Service layer for agodoc

pub mod check;
pub mod config;
pub mod editor;
pub mod import_path;
pub mod loader;
pub mod locate;
pub mod resolve;
pub mod viewer;

pub use config::{ConfigService, DefaultConfigService};
pub use editor::{AcmeEditorService, EditorService};
pub use import_path::ImportPathFinder;
pub use loader::{Program, load_program};
pub use resolve::{classify, resolve};
pub use viewer::{DefaultViewerService, ViewerService};
