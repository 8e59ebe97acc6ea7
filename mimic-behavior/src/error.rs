use mimic_common::ConfigViolation;

/// Failures surfaced by the behavior layer.
///
/// Permission denials are not errors: the rate governor answers them with a
/// plain `bool`.
#[derive(thiserror::Error, Debug)]
pub enum BehaviorError {
    /// The page handle rejected a primitive. Side effects already applied
    /// (keystrokes typed, scroll steps taken) are not rolled back.
    #[error("{action} failed: {source}")]
    Interaction {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The cancellation token fired between or during steps.
    #[error("operation cancelled")]
    Cancelled,

    /// A controller was constructed from an unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigViolation),
}

pub type Result<T> = std::result::Result<T, BehaviorError>;

/// Tag a page-handle failure with the primitive that produced it.
pub(crate) trait InteractionExt<T> {
    fn during(self, action: &'static str) -> Result<T>;
}

impl<T> InteractionExt<T> for anyhow::Result<T> {
    fn during(self, action: &'static str) -> Result<T> {
        self.map_err(|source| BehaviorError::Interaction { action, source })
    }
}
