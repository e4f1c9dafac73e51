//! Core attachment storage logic for Unidata.
//!
//! # Modules
//!
//! - `storage` - Provider backends, session pool and the storage service
//! - `attachment` - Upload helper for named files and raw buffers

pub mod attachment;
pub mod storage;
