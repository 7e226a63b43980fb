//! Startup routing
//!
//! The first-launch flag is read once when the app starts and written once,
//! on the very first run. The result travels in a [`BootstrapConfig`] to the
//! router instead of being re-read from storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;

/// Persistent "app has been opened before" flag
#[async_trait]
pub trait LaunchFlagStore: Send + Sync + std::fmt::Debug {
    async fn has_launched(&self) -> Result<bool>;

    async fn mark_launched(&self) -> Result<()>;
}

/// Source of the signed-in state
#[async_trait]
pub trait AuthStatus: Send + Sync + std::fmt::Debug {
    async fn is_authenticated(&self) -> Result<bool>;
}

/// Launch flag kept as a marker file
#[derive(Debug, Clone)]
pub struct FileLaunchFlag {
    path: PathBuf,
}

impl FileLaunchFlag {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LaunchFlagStore for FileLaunchFlag {
    async fn has_launched(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    async fn mark_launched(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, "true").await?;
        Ok(())
    }
}

/// Fixed authentication answer
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth(pub bool);

#[async_trait]
impl AuthStatus for StaticAuth {
    async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.0)
    }
}

/// Process-wide startup state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub first_launch: bool,
}

impl BootstrapConfig {
    /// Read the flag, and on first launch write it.
    pub async fn load(store: &dyn LaunchFlagStore) -> Result<Self> {
        let first_launch = !store.has_launched().await?;
        if first_launch {
            store.mark_launched().await?;
            tracing::info!("First launch recorded");
        }
        Ok(Self { first_launch })
    }
}

/// Where the app lands after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Onboarding,
    Login,
    Main,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Onboarding => "/auth/onboarding",
            Route::Login => "/auth/login",
            Route::Main => "/(tabs)",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Pick the landing route for already-loaded startup state.
pub async fn resolve_route(config: &BootstrapConfig, auth: &dyn AuthStatus) -> Route {
    if config.first_launch {
        tracing::info!("First launch, showing onboarding");
        return Route::Onboarding;
    }

    match auth.is_authenticated().await {
        Ok(true) => {
            tracing::info!("Authenticated, navigating to main");
            Route::Main
        }
        Ok(false) => {
            tracing::info!("Not authenticated, navigating to login");
            Route::Login
        }
        Err(e) => {
            tracing::error!("Auth check failed: {}", e);
            Route::Login
        }
    }
}

/// Load startup state and route. Storage errors land on login.
pub async fn bootstrap(store: &dyn LaunchFlagStore, auth: &dyn AuthStatus) -> Route {
    match BootstrapConfig::load(store).await {
        Ok(config) => resolve_route(&config, auth).await,
        Err(e) => {
            tracing::error!("App initialization error: {}", e);
            Route::Login
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SafeherError;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct FailingAuth;

    #[async_trait]
    impl AuthStatus for FailingAuth {
        async fn is_authenticated(&self) -> Result<bool> {
            Err(SafeherError::Directory("session store offline".to_string()))
        }
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Onboarding.path(), "/auth/onboarding");
        assert_eq!(Route::Login.to_string(), "/auth/login");
        assert_eq!(Route::Main.path(), "/(tabs)");
    }

    #[test]
    fn test_resolve_route() {
        let first = BootstrapConfig { first_launch: true };
        let returning = BootstrapConfig { first_launch: false };

        assert_eq!(
            tokio_test::block_on(resolve_route(&first, &StaticAuth(true))),
            Route::Onboarding
        );
        assert_eq!(
            tokio_test::block_on(resolve_route(&returning, &StaticAuth(true))),
            Route::Main
        );
        assert_eq!(
            tokio_test::block_on(resolve_route(&returning, &StaticAuth(false))),
            Route::Login
        );
        assert_eq!(
            tokio_test::block_on(resolve_route(&returning, &FailingAuth)),
            Route::Login
        );
    }

    #[tokio::test]
    async fn test_file_flag_written_once() {
        let dir = tempdir().unwrap();
        let store = FileLaunchFlag::new(dir.path().join("state").join("has_launched"));

        let first = BootstrapConfig::load(&store).await.unwrap();
        assert!(first.first_launch);
        assert!(store.path().exists());

        let second = BootstrapConfig::load(&store).await.unwrap();
        assert!(!second.first_launch);
    }
}
