pub mod asm;
pub mod binary;
pub mod image;
pub mod project;
