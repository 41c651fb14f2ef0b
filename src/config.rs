//! Backend location and editor options.

use crate::error::ConfigError;
use crate::model::CropUnit;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8082";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub list_route: String,
    pub save_route: String,
    /// Static-file route the images themselves are served from.
    pub images_route: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            list_route: "/list".to_string(),
            save_route: "/save_annotations".to_string(),
            images_route: "/images".to_string(),
        }
    }
}

impl BackendConfig {
    /// Builds the config from the program arguments (without argv[0]). At most
    /// one positional argument is accepted: the backend base URL.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut config = Self::default();

        if let Some(base) = args.next() {
            config = config.with_base_url(&base)?;
        }
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base: &str) -> Result<Self, ConfigError> {
        let trimmed = base.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base.to_string()));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_route)
    }

    pub fn save_url(&self) -> String {
        format!("{}{}", self.base_url, self.save_route)
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}{}/{}", self.base_url, self.images_route, name)
    }
}

// ── Editor Options ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectLock {
    #[default]
    Free,
    Widescreen,
}

impl AspectLock {
    pub fn ratio(&self) -> Option<f32> {
        match self {
            AspectLock::Free => None,
            AspectLock::Widescreen => Some(16.0 / 9.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectLock::Free => "Free",
            AspectLock::Widescreen => "16:9",
        }
    }

    pub fn all() -> &'static [AspectLock] {
        &[AspectLock::Free, AspectLock::Widescreen]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorOptions {
    pub aspect: AspectLock,
    /// Unit new crops are recorded in. Saved boxes are always natural pixels.
    pub unit: CropUnit,
}
