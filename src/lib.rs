// Annotation ruler library - decorations and overview strip for text editors

pub mod config;
pub mod error;

// Organized modules
pub mod model;
pub mod services;
pub mod view;

pub use config::{AnnotationTypeConfig, ConfigError, OverviewConfig, RulerConfig};
pub use error::RulerError;
