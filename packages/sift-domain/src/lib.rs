pub mod document;
pub mod fingerprint;
pub mod similarity;
pub mod tokenizer;

pub use document::Document;
