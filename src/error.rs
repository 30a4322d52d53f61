use thiserror::Error;

/// Error taxonomy for sampler execution.
///
/// Variants map onto the failure classes a `Sampler::sample()` call can
/// surface: a single resource that failed to read (`Transient`), a runtime
/// that is not reachable at all (`RuntimeUnavailable`), a failure that
/// invalidates the whole batch (`PassFatal`), the zero-RSS skip sentinel,
/// and a captured panic.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// A single resource (pid, container) failed to read this pass. The
    /// resource is skipped and the pass continues; logged at debug.
    #[error("transient probe failure for {resource}: {source}")]
    Transient {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    /// The backing runtime (Docker/containerd socket) is not reachable.
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// A failure that invalidates the current batch; no partial batch is
    /// emitted and the scheduler retries on the next tick.
    #[error("pass aborted: {0}")]
    PassFatal(#[source] anyhow::Error),

    /// Sentinel used to silently skip a zero-RSS process. Not fatal; never
    /// surfaced above trace level.
    #[error("zero-rss sentinel for pid {0}")]
    ZeroRss(u32),

    /// A dependency of `sample()` panicked; the panic payload (and a
    /// captured backtrace, when available) is converted into this error so
    /// the scheduler can log it and continue with the next tick.
    #[error("sampler panicked: {message}")]
    Panic {
        message: String,
        backtrace: Option<String>,
    },

    /// The call did not return within the per-tick timeout derived from the
    /// sampler's interval.
    #[error("probe timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl SamplerError {
    /// True for the zero-RSS sentinel — callers treat this as "nothing to
    /// emit for this pid", not a pass failure.
    pub fn is_zero_rss(&self) -> bool {
        matches!(self, SamplerError::ZeroRss(_))
    }

    /// True for errors that should only ever reach trace-level logging.
    pub fn is_trace_only(&self) -> bool {
        self.is_zero_rss()
    }

    pub fn transient(resource: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        SamplerError::Transient {
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Build a `Panic` variant from a `catch_unwind` payload.
    pub fn from_panic_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        SamplerError::Panic {
            message,
            backtrace: Some(std::backtrace::Backtrace::force_capture().to_string()),
        }
    }
}

pub type SamplerResult<T> = Result<T, SamplerError>;
