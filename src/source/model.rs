use crate::policy::types::DataSource;

/// Kind of load model, derived from its scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Http,
    Content,
    AndroidResource,
}

impl ModelKind {
    pub fn classify(model: &str) -> Option<Self> {
        let model = model.trim();
        let (scheme, _) = model.split_once(':')?;
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Some(ModelKind::Http),
            "content" => Some(ModelKind::Content),
            "android.resource" => Some(ModelKind::AndroidResource),
            _ => None,
        }
    }

    /// Origin reported for a fresh fetch of this kind of model.
    pub fn data_source(self) -> DataSource {
        match self {
            ModelKind::Http => DataSource::Remote,
            ModelKind::Content | ModelKind::AndroidResource => DataSource::Local,
        }
    }
}
