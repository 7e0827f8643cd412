pub mod migrations;
pub mod price_repo;
pub mod product_repo;
pub mod vector_index;
