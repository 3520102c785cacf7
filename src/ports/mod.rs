pub mod oauth;
pub mod photos;
pub mod uploader;
