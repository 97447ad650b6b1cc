//! In-memory handling of `multipart/form-data` submissions

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use pipeline::{ApiError, MultipartResolver, RequestContext, Step, UploadHandler};
use tracing::{debug, warn};

/// One uploaded file held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Text parts become request parameters; file parts are buffered until the
/// request ends or is rolled back
#[derive(Debug, Default)]
pub struct BufferedUpload {
    parameters: Vec<(String, String)>,
    files: Mutex<Vec<UploadedFile>>,
}

impl BufferedUpload {
    pub fn files(&self) -> Vec<UploadedFile> {
        match self.files.lock() {
            Ok(files) => files.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UploadHandler for BufferedUpload {
    fn rollback(&self) {
        let mut files = match self.files.lock() {
            Ok(files) => files,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!(discarded = files.len(), "Rolling back uploaded files");
        files.clear();
    }

    /// Text fields, then one `field=file_name` pair per uploaded file
    fn parameters(&self) -> Vec<(String, String)> {
        let mut params = self.parameters.clone();
        params.extend(
            self.files()
                .into_iter()
                .map(|file| (file.field, file.file_name)),
        );
        params
    }
}

/// Parses multipart bodies with `multer`
#[derive(Debug, Clone)]
pub struct MultipartUploads {
    max_file_bytes: usize,
}

impl MultipartUploads {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    async fn parse(&self, ctx: &RequestContext) -> Result<BufferedUpload, String> {
        let boundary = ctx
            .content_type()
            .ok_or_else(|| "missing content type".to_string())
            .and_then(|ct| multer::parse_boundary(ct).map_err(|e| e.to_string()))?;

        let body = ctx.body().clone();
        let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut parameters = Vec::new();
        let mut files = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(|m| m.to_string());
                    let data = field.bytes().await.map_err(|e| e.to_string())?;
                    if data.len() > self.max_file_bytes {
                        return Err(format!(
                            "file '{}' exceeds maximum size of {} bytes",
                            file_name, self.max_file_bytes
                        ));
                    }
                    files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|e| e.to_string())?;
                    parameters.push((name, value));
                }
            }
        }

        Ok(BufferedUpload {
            parameters,
            files: Mutex::new(files),
        })
    }
}

impl Default for MultipartUploads {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

#[async_trait]
impl MultipartResolver for MultipartUploads {
    async fn resolve(&self, ctx: &RequestContext) -> Step<Option<Arc<dyn UploadHandler>>> {
        match self.parse(ctx).await {
            Ok(upload) => {
                debug!(files = upload.files().len(), "Multipart request parsed");
                Step::Continue(Some(Arc::new(upload)))
            }
            Err(reason) => {
                warn!(%reason, "Malformed multipart request");
                Step::stop(ApiError::bad_request(
                    "MalformedMultipart",
                    format!("Multipart body could not be decoded: {}", reason),
                ))
            }
        }
    }
}
