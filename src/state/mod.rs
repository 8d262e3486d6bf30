// ============================================================================
// STATE MODULE - session state shared through Rc<RefCell>
// ============================================================================

pub mod user_session;

pub use user_session::{SessionError, SessionHandle, UserSession};
