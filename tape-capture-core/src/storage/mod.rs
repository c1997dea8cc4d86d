pub mod metadata;
pub mod tape_file;
