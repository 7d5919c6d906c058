pub mod binary;
pub mod extension;
pub mod language;
pub mod stub_kind;

pub use binary::*;
pub use extension::*;
pub use language::*;
pub use stub_kind::*;
