pub mod batch_service;
pub mod declaration_service;
