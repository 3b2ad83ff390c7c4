// Scoring pipeline: extraction, cleaning, vectorization, ranking, reporting.
// Per-document stages run concurrently on the blocking pool; vectorization
// is a single joint computation over the whole batch.

pub mod cache;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod rank;
pub mod report;
pub mod stopwords;
pub mod vectorize;
