pub mod embeddings;
pub mod intent;
pub mod sqlite;
