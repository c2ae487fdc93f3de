pub mod builder;
pub mod descriptor;
pub mod engine;

pub use builder::build_image;
pub use descriptor::BuildDescriptor;
pub use engine::{ContainerEngine, DockerCli};
