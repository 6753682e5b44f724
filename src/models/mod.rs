pub mod product;

pub use product::{Product, ProductInput, ProductPatch, ProductRecord};
