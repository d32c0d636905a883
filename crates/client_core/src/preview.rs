use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::UploadedFile;

/// Display-only `data:` URI derived from the current selection. The
/// controller owns at most one handle; replacing or clearing it is the
/// release protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    data_uri: String,
}

impl PreviewHandle {
    pub fn derive(file: &UploadedFile) -> Self {
        let encoded = STANDARD.encode(&file.content);
        Self {
            data_uri: format!("data:{};base64,{encoded}", file.media_type),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}
