#![cfg(feature = "s3")]

use super::{ArchiveError, ArchiveResult, ArchiveStore};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Anonymous, read-only access to a public S3 bucket.
///
/// Owns a current thread runtime so callers stay synchronous.
pub struct S3Archive {
    runtime: Runtime,
    client: Client,
    bucket: String,
}

impl S3Archive {
    pub fn connect(bucket: &str, region: &str) -> ArchiveResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .no_credentials()
                .region(Region::new(region.to_string()))
                .load(),
        );
        Ok(Self {
            runtime,
            client: Client::new(&config),
            bucket: bucket.to_string(),
        })
    }

    /// One listing, following continuation tokens until the last page
    fn list(&self, prefix: &str, delimiter: Option<&str>) -> ArchiveResult<Vec<String>> {
        self.runtime.block_on(async {
            let mut found = vec![];
            let mut token: Option<String> = None;
            loop {
                let response = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .prefix(prefix)
                    .set_delimiter(delimiter.map(str::to_string))
                    .set_continuation_token(token.take())
                    .send()
                    .await
                    .map_err(|e| ArchiveError::List {
                        prefix: prefix.to_string(),
                        reason: DisplayErrorContext(&e).to_string(),
                    })?;

                if delimiter.is_some() {
                    found.extend(
                        response
                            .common_prefixes()
                            .iter()
                            .filter_map(|p| p.prefix().map(str::to_string)),
                    );
                } else {
                    found.extend(
                        response
                            .contents()
                            .iter()
                            .filter_map(|object| object.key().map(str::to_string)),
                    );
                }

                match response.next_continuation_token() {
                    Some(next) => token = Some(next.to_string()),
                    None => break,
                }
            }
            debug!("Listed {} entries under s3://{}/{prefix}", found.len(), self.bucket);
            Ok(found)
        })
    }
}

impl fmt::Debug for S3Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Archive")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ArchiveStore for S3Archive {
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        self.list(prefix, Some("/"))
    }

    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        self.list(prefix, None)
    }

    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64> {
        let download_error = |reason: String| ArchiveError::Download {
            key: key.to_string(),
            reason,
        };

        self.runtime.block_on(async {
            let mut object = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| download_error(DisplayErrorContext(&e).to_string()))?;

            let mut file = tokio::fs::File::create(dest).await?;
            let mut bytes_written = 0;
            while let Some(bytes) = object
                .body
                .try_next()
                .await
                .map_err(|e| download_error(e.to_string()))?
            {
                file.write_all(&bytes).await?;
                bytes_written += bytes.len() as u64;
            }
            file.flush().await?;
            Ok(bytes_written)
        })
    }
}
