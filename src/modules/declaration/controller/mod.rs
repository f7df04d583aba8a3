pub mod batch;
pub mod declaration;
