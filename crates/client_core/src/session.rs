use shared::domain::SessionId;
use uuid::Uuid;

/// Creates the identifier used for every backend call of one orchestrator.
///
/// A UUIDv7 combines a millisecond timestamp with random bits, which is
/// enough to keep ids apart across processes and restarts.
pub fn create_session_id() -> SessionId {
    SessionId::new(Uuid::now_v7().to_string())
}
