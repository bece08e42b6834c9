//! Book recommendations for the dashboard

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{error::AppResult, models::book::Book, repository::Repository};

/// Upper bound on the number of recommended books
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Pick up to `limit` books at random, available ones first.
///
/// When at least one book is available only available books are
/// candidates; otherwise every book is. The order is not deterministic.
pub fn pick_recommendations<R: Rng + ?Sized>(
    books: Vec<Book>,
    limit: usize,
    rng: &mut R,
) -> Vec<Book> {
    let (available, issued): (Vec<Book>, Vec<Book>) =
        books.into_iter().partition(Book::is_available);
    let mut candidates = if available.is_empty() { issued } else { available };

    candidates.shuffle(rng);
    candidates.truncate(limit.min(MAX_RECOMMENDATIONS));
    candidates
}

#[derive(Clone)]
pub struct RecommendationService {
    repository: Repository,
    limit: usize,
}

impl RecommendationService {
    pub fn new(repository: Repository, limit: usize) -> Self {
        Self {
            repository,
            limit: limit.min(MAX_RECOMMENDATIONS),
        }
    }

    /// Recommend books using the supplied randomness source
    pub async fn recommend<R: Rng + ?Sized>(
        &self,
        limit: Option<usize>,
        rng: &mut R,
    ) -> AppResult<Vec<Book>> {
        let mut conn = self.repository.acquire().await?;
        let books = self.repository.books.list(&mut *conn).await?;
        drop(conn);

        Ok(pick_recommendations(books, limit.unwrap_or(self.limit), rng))
    }
}
