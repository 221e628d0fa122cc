use std::future::Future;

use mindflow_lesson::Lesson;

use crate::error::StoreError;

/// Persistent lesson lookup keyed by lesson id.
pub trait LessonStore: Send + Sync {
    /// Fetch a stored lesson, `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored lesson no longer validates.
    fn get(
        &self,
        lesson_id: &str,
    ) -> impl Future<Output = Result<Option<Lesson>, StoreError>> + Send;

    /// Insert or replace the lesson stored under `lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn put(
        &self,
        lesson_id: &str,
        title: &str,
        lesson: &Lesson,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
