// HTTP routes
pub mod health;
pub mod jobs;
pub mod runs;
pub mod sources;
pub mod stream;

pub use health::*;
pub use jobs::*;
pub use runs::*;
pub use sources::*;
pub use stream::*;
