use crate::domain::error::DomainError;

pub trait VectorIndex: Send + Sync {
    fn store(&self, product_id: &str, vector: &[f32]) -> Result<(), DomainError>;
    /// Product ids with similarity scores, best first.
    fn search_similar(&self, vector: &[f32], limit: usize) -> Result<Vec<(String, f64)>, DomainError>;
    fn has_vector(&self, product_id: &str) -> Result<bool, DomainError>;
    fn stored_dimension(&self) -> Result<Option<usize>, DomainError>;
}
