pub mod resume_version;
