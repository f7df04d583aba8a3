pub mod batch_repo;
pub mod declaration_repo;
pub mod filter;
