pub mod datafiles;
pub mod docs;
pub mod generate;
pub mod solve;

pub use datafiles::*;
pub use docs::*;
pub use generate::*;
pub use solve::*;
