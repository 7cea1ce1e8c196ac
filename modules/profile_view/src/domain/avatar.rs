use url::Url;

/// Resolves what the profile picture slot shows.
#[derive(Debug, Clone)]
pub struct AvatarResolver {
    storage_base: Url,
    placeholder_base: String,
}

impl AvatarResolver {
    /// `storage_base` is where stored pictures are served, e.g. `http://host/storage/`.
    pub fn new(storage_base: Url, placeholder_base: impl Into<String>) -> Self {
        let mut storage_base = storage_base;
        if !storage_base.path().ends_with('/') {
            let path = format!("{}/", storage_base.path());
            storage_base.set_path(&path);
        }
        Self {
            storage_base,
            placeholder_base: placeholder_base.into(),
        }
    }

    /// Preview of a pending upload first, then the stored picture, then a placeholder.
    pub fn resolve(&self, name: &str, picture: Option<&str>, preview: Option<&str>) -> String {
        if let Some(p) = preview {
            return p.to_string();
        }
        picture
            .filter(|p| !p.trim().is_empty())
            .and_then(|p| self.stored(p))
            .unwrap_or_else(|| self.placeholder(name))
    }

    pub fn placeholder(&self, name: &str) -> String {
        format!(
            "{}?name={}&background=random",
            self.placeholder_base,
            urlencoding::encode(name)
        )
    }

    fn stored(&self, reference: &str) -> Option<String> {
        if let Ok(absolute) = Url::parse(reference) {
            return Some(absolute.into());
        }
        self.storage_base
            .join(reference.trim_start_matches('/'))
            .ok()
            .map(Into::into)
    }
}
