/// Errors raised by the replication layer.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// Something other than the state-authority holder tried to write the
    /// replicated transform.
    #[error("write rejected: this process does not hold state authority")]
    NotAuthority,
}
