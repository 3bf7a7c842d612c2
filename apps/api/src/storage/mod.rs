//! Blob store for uploaded resume files (S3 or MinIO).

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::DocumentFormat;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

/// Upload bytes, get back a public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Unique object key for a new resume file. The client filename is never
/// part of the key.
pub fn resume_object_key(format: DocumentFormat) -> String {
    format!("resumes/{}.{}", Uuid::new_v4().simple(), format.extension())
}

/// Path-style public URL: `{base}/{bucket}/{key}`.
pub fn public_object_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_url: String) -> Self {
        Self {
            client,
            bucket,
            public_url,
        }
    }

    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "resume-matcher-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        // MinIO only serves path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
            .force_path_style(true)
            .build();

        Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.s3_bucket.clone(),
            config.s3_public_url.clone(),
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(public_object_url(&self.public_url, &self.bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_object_key_shape() {
        let key = resume_object_key(DocumentFormat::Docx);
        assert!(key.starts_with("resumes/"));
        assert!(key.ends_with(".docx"));
        assert_eq!(key.len(), "resumes/".len() + 32 + ".docx".len());
        assert_ne!(key, resume_object_key(DocumentFormat::Docx));
    }

    #[test]
    fn test_public_object_url_trims_trailing_slash() {
        assert_eq!(
            public_object_url("http://localhost:9000/", "resumes", "resumes/a.pdf"),
            "http://localhost:9000/resumes/resumes/a.pdf"
        );
    }
}
