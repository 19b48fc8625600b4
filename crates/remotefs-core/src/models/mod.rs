//! Domain models shared between the driver, the slave client and callers.

mod file;
mod policy;
mod upload;

pub use file::{Entity, MediaMeta, PhysicalObject, SourceArgs};
pub use policy::{Node, PolicySettings, StoragePolicy};
pub use upload::{UploadCredential, UploadProps, UploadRequest, UploadStream};
