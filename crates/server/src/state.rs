use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use archive::{FtpArchive, RemoteArchive};
use cache::DocumentResolver;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide liveness flag.
///
/// Set right before the listener starts serving, cleared as the first step
/// of shutdown so probes fail while in-flight requests drain.
#[derive(Debug, Default)]
pub struct HealthFlag(AtomicBool);

impl HealthFlag {
    pub fn is_healthy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_healthy(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn mark_unhealthy(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Cache-first document lookup backed by the archive
    pub resolver: DocumentResolver,

    /// Liveness reported by `/healthz`
    pub health: Arc<HealthFlag>,
}

impl ServerState {
    /// Create state talking to the FTP archive described in `config`
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let archive = Arc::new(FtpArchive::new(config.archive.clone()));
        Self::with_archive(config, archive)
    }

    /// Create state with any archive implementation
    pub fn with_archive(
        config: ServerConfig,
        archive: Arc<dyn RemoteArchive>,
    ) -> ServerResult<Self> {
        if !config.directory.is_dir() {
            return Err(ServerError::Config(format!(
                "document directory {} does not exist",
                config.directory.display()
            )));
        }

        let resolver = DocumentResolver::new(config.directory.clone(), archive);
        Ok(Self {
            config: Arc::new(config),
            resolver,
            health: Arc::new(HealthFlag::default()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        self.resolver.cache_dir()
    }
}
