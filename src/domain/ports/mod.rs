pub mod clock;
pub mod embedding_port;
pub mod intent_parser;
pub mod lens;
pub mod price_repository;
pub mod product_repository;
pub mod vector_index;
