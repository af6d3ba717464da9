pub mod fields;
pub mod native;
pub mod object;
pub mod stack;
#[allow(clippy::module_inception)]
mod vm;

pub use self::vm::Vm;
