#![allow(unused_imports)]

pub mod config;
pub mod files;
pub mod generate;

pub use files::{FileState, GeminiFile, get_file, upload_file};
pub use generate::{
    Content, GenerateContentRequest, GenerationConfig, Tool, extract_sources, extract_text,
    generate_content,
};
