pub mod error;
pub mod holder;
pub mod search;

pub use error::VcHolderError;
pub use holder::{KmsVcHolder, VcHolder};
pub use search::{KmsVcRecordSearch, VcRecordSearch};
