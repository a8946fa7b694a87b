pub mod cloud;
pub mod defaults;
pub mod k8s;
pub mod sensitive;

pub use defaults::{ImagePullPolicy, ParsePullPolicyError};
pub use k8s::Manifest;
pub use sensitive::Sensitive;
