pub mod config;
pub mod error;
pub mod file_scanner;
pub mod hue;
pub mod json_export;
pub mod layout;
pub mod metadata_extractor;
pub mod page_assembler;
pub mod photo;
pub mod photo_loader;
pub mod planner;
pub mod renderer;
pub mod scoring;
pub mod selector;
