pub mod albums;
pub mod credentials;
pub mod ingest;
pub mod photos;
pub mod upload;
