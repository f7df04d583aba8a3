pub mod batch;
pub mod declaration;
pub mod status;

pub use batch::{BatchInput, BatchKey, BatchListQuery, BatchUpdateInput, DeclarationBatch};
pub use declaration::{Declaration, DeclarationHistory, DeclarationInput, PendingDuplicate};
pub use status::{BatchStatus, DeclarationStatus, PaymentStatus};
