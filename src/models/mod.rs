pub mod document;
pub mod domain;
pub mod enums;
pub mod feedback;
pub mod model_version;
pub mod preview;

pub use document::*;
pub use domain::*;
pub use enums::*;
pub use feedback::*;
pub use model_version::*;
pub use preview::*;
