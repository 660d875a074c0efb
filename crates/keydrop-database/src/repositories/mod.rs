//! PostgreSQL implementations of the store traits.

pub mod record;
pub mod settings;
pub mod view_pointer;

pub use record::{PgClaimTransaction, RecordRepository};
pub use settings::CommunitySettingsRepository;
pub use view_pointer::ViewPointerRepository;
