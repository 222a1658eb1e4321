//! Object store session (S3, local filesystem, in-memory)

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use glob::{MatchOptions, Pattern};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// `*` must not cross directory boundaries
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A resolved object (or directory prefix) inside a store
#[derive(Debug, Clone)]
pub struct Location {
    /// `scheme://bucket` the path is relative to
    root: String,
    /// Store serving the root
    store: Arc<dyn ObjectStore>,
    /// Path within the store
    path: ObjectPath,
}

impl Location {
    /// Store serving this location
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Path within the store
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Location of a direct child
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            root: self.root.clone(),
            store: Arc::clone(&self.store),
            path: self.path.child(name),
        }
    }

    /// Location of another path in the same store
    #[must_use]
    pub fn with_path(&self, path: ObjectPath) -> Self {
        Self {
            root: self.root.clone(),
            store: Arc::clone(&self.store),
            path,
        }
    }

    /// Fully qualified URL, for logging
    pub fn url(&self) -> String {
        if self.path.as_ref().is_empty() {
            self.root.clone()
        } else {
            format!("{}/{}", self.root, self.path)
        }
    }
}

/// Object store session shared by every pipeline of a run
///
/// Stores are created lazily per `scheme://bucket` and cached. Dropping the
/// session releases all of them.
#[derive(Debug)]
pub struct Session {
    config: StorageConfig,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl Session {
    /// Open a session with the given connection settings
    pub fn open(config: &StorageConfig) -> Result<Self> {
        tracing::info!(
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            virtual_hosted_style = config.virtual_hosted_style,
            "Opened object store session"
        );
        Ok(Self {
            config: config.clone(),
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// Serve `root` (`scheme://bucket`) from a pre-built store
    pub fn register(&self, root: &str, store: Arc<dyn ObjectStore>) -> Result<()> {
        let url = parse_url(root)?;
        let key = store_key(&url);
        self.lock()?.insert(key, store);
        Ok(())
    }

    /// Number of stores created so far
    pub fn store_count(&self) -> usize {
        self.stores.lock().map(|s| s.len()).unwrap_or_default()
    }

    /// Resolve a URL or local path to a store and a path within it
    ///
    /// Supported formats:
    /// - `s3a://bucket/path` / `s3://bucket/path` - AWS S3 or S3-compatible
    /// - `memory://name/path` - in-process store, shared per name
    /// - `file:///abs/path` or a plain path - local filesystem
    pub fn resolve(&self, location: &str) -> Result<Location> {
        let url = if location.contains("://") {
            parse_url(location)?
        } else {
            let absolute = std::path::absolute(location)?;
            Url::from_file_path(&absolute)
                .map_err(|()| Error::invalid_url(location, "not an absolute path"))?
        };

        let key = store_key(&url);
        let path = ObjectPath::from_url_path(url.path())
            .map_err(|e| Error::invalid_url(location, e.to_string()))?;

        let store = {
            let mut stores = self.lock()?;
            if let Some(store) = stores.get(&key) {
                Arc::clone(store)
            } else {
                let store = self.build_store(&url)?;
                tracing::debug!(root = %key, "Created object store");
                stores.insert(key.clone(), Arc::clone(&store));
                store
            }
        };

        Ok(Location {
            root: key,
            store,
            path,
        })
    }

    /// List every object under `root` whose key relative to `root` matches `glob`
    ///
    /// Hidden entries (a path segment starting with `_` or `.`) are skipped.
    /// Results are sorted by key.
    pub async fn list_matching(&self, root: &Location, glob: &str) -> Result<Vec<ObjectMeta>> {
        let pattern = Pattern::new(glob)
            .map_err(|e| Error::config(format!("Invalid glob pattern '{glob}': {e}")))?;
        let prefix = root.path().as_ref().to_string();

        let listed: Vec<ObjectMeta> = root
            .store()
            .list(Some(root.path()))
            .try_collect()
            .await?;

        let mut matched: Vec<ObjectMeta> = listed
            .into_iter()
            .filter(|meta| {
                relative_key(&prefix, meta.location.as_ref()).is_some_and(|rel| {
                    !is_hidden(rel) && pattern.matches_with(rel, GLOB_OPTIONS)
                })
            })
            .collect();
        matched.sort_by(|a, b| a.location.cmp(&b.location));

        tracing::debug!(
            root = %root.url(),
            glob,
            matched = matched.len(),
            "Listed raw objects"
        );
        Ok(matched)
    }

    /// Read a whole object
    pub async fn read(&self, location: &Location) -> Result<Bytes> {
        let result = location.store().get(location.path()).await?;
        Ok(result.bytes().await?)
    }

    /// Write bytes to an object, returning its URL
    pub async fn write(&self, location: &Location, data: Bytes) -> Result<String> {
        location
            .store()
            .put(location.path(), data.into())
            .await
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", location.url())))?;
        Ok(location.url())
    }

    /// Delete every object under a prefix, returning how many were removed
    pub async fn delete_prefix(&self, location: &Location) -> Result<usize> {
        let listed: Vec<ObjectMeta> = location
            .store()
            .list(Some(location.path()))
            .try_collect()
            .await?;
        for meta in &listed {
            location.store().delete(&meta.location).await?;
        }
        Ok(listed.len())
    }

    fn build_store(&self, url: &Url) -> Result<Arc<dyn ObjectStore>> {
        match url.scheme() {
            "s3" | "s3a" => self.build_s3(url),
            "memory" => Ok(Arc::new(InMemory::new())),
            "file" => Ok(Arc::new(LocalFileSystem::new())),
            other => Err(Error::invalid_url(
                url.as_str(),
                format!("unsupported scheme '{other}'"),
            )),
        }
    }

    fn build_s3(&self, url: &Url) -> Result<Arc<dyn ObjectStore>> {
        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::invalid_url(url.as_str(), "missing bucket"))?;

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_virtual_hosted_style_request(self.config.virtual_hosted_style)
            .with_allow_http(self.config.allow_http);

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(normalize_endpoint(endpoint));
        }
        if let Some(region) = &self.config.region {
            builder = builder.with_region(region);
        }
        if let (Some(key), Some(secret)) =
            (&self.config.access_key_id, &self.config.secret_access_key)
        {
            builder = builder
                .with_access_key_id(key)
                .with_secret_access_key(secret);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?;
        Ok(Arc::new(store))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<dyn ObjectStore>>>> {
        self.stores
            .lock()
            .map_err(|_| Error::Other("object store cache poisoned".to_string()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::info!(stores = self.store_count(), "Released object store session");
    }
}

fn parse_url(location: &str) -> Result<Url> {
    Url::parse(location).map_err(|e| Error::invalid_url(location, e.to_string()))
}

/// `scheme://host`, the cache key of a store
fn store_key(url: &Url) -> String {
    format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default())
}

/// Endpoints given as bare hosts are assumed to be HTTPS
fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

fn relative_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        Some(key)
    } else {
        key.strip_prefix(prefix)?.strip_prefix('/')
    }
}

fn is_hidden(relative: &str) -> bool {
    relative
        .split('/')
        .any(|segment| segment.starts_with('_') || segment.starts_with('.'))
}
