pub mod products;

pub use products::{
    create_product, delete_product, get_product, patch_product, replace_product, undelete_product,
};
