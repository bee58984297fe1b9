mod annotation;
mod edge;
mod flow;
mod group;

pub use annotation::AnnotationModel;
pub use edge::EdgeModel;
pub use flow::FlowModel;
pub use group::{GroupModel, StepModel};
