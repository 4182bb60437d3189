pub mod decode;
pub mod gallery;
pub mod generate;
pub mod placeholder;
pub mod provider;
