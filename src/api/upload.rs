use super::{decode_envelope, ApiClient, ApiError};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bytes handed to the transport per progress tick.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

impl ApiClient {
    /// Multipart upload of a single `file` field, reporting byte progress as
    /// the body is streamed to the server.
    pub async fn upload<T, F>(
        &self,
        endpoint: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
        on_progress: F,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(UploadProgress { sent, total });
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        tracing::debug!(endpoint, file_name, total, "API upload");
        let resp = self
            .http
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await?;
        decode_envelope(resp).await
    }
}
