pub mod descriptor;
pub mod detector;

pub use descriptor::{DescriptorError, InheritanceDescriptor};
pub use detector::InheritanceDetector;
