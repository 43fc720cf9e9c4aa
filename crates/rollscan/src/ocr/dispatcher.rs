//! Bounded parallel OCR over a card batch.
//!
//! Cards are spawned as independent tasks behind a semaphore and joined
//! into a vector ordered by submission index. A failed or panicked task
//! degrades to an empty outcome for its slot; it never aborts the batch.

use crate::config::PreprocessConfig;
use crate::error::Result;
use crate::ocr::TextRecognizer;
use crate::preprocess::prepare_for_ocr;
use crate::types::{OcrOutcome, RunBatch};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fans card images out over a bounded recognizer pool.
pub struct OcrDispatcher<R> {
    recognizer: Arc<R>,
    preprocess: PreprocessConfig,
    max_concurrent: usize,
}

impl<R: TextRecognizer + 'static> OcrDispatcher<R> {
    pub fn new(recognizer: Arc<R>, preprocess: PreprocessConfig, max_concurrent: usize) -> Self {
        Self {
            recognizer,
            preprocess,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Recognize every card in the batch.
    ///
    /// The returned vector has exactly one outcome per input card, in
    /// input order, regardless of individual recognition failures.
    pub async fn recognize_batch(&self, batch: RunBatch) -> Result<Vec<OcrOutcome>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let total = batch.len();
        tracing::debug!(total, max_concurrent = self.max_concurrent, "dispatching ocr batch");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, card) in batch.into_iter().enumerate() {
            let recognizer = Arc::clone(&self.recognizer);
            let preprocess = self.preprocess;
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Closed only when the set is dropped, which cannot happen
                // while this task runs.
                let Ok(_permit) = semaphore.acquire().await else {
                    return OcrOutcome::failed(index);
                };
                let prepared = prepare_for_ocr(card.as_image(), &preprocess);
                match recognizer.recognize(&prepared).await {
                    Ok(text) => OcrOutcome::recognized(index, text),
                    Err(e) => {
                        tracing::warn!(index, error = %e, "card recognition failed");
                        OcrOutcome::failed(index)
                    }
                }
            });
        }

        let mut slots: Vec<Option<OcrOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    let index = outcome.index;
                    slots[index] = Some(outcome);
                }
                Err(e) => {
                    // Index is lost with the task; unfilled slots are
                    // backfilled below.
                    tracing::warn!(error = %e, "ocr task aborted");
                }
            }
        }

        Ok(slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| OcrOutcome::failed(index)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RollscanError;
    use crate::types::CardImage;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Recognizer keyed on the card's top-left gray value, so outcomes can
    /// be traced back to their submission index.
    struct IndexedStub {
        fail_value: Option<u8>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl IndexedStub {
        fn new(fail_value: Option<u8>) -> Self {
            Self {
                fail_value,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for IndexedStub {
        async fn recognize(&self, image: &DynamicImage) -> crate::error::Result<String> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);

            let value = image.to_luma8().get_pixel(0, 0)[0];
            // Later cards finish earlier, stressing the ordering guarantee.
            tokio::time::sleep(Duration::from_millis((64 - value.min(60)) as u64)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_value == Some(value) {
                return Err(RollscanError::ocr("stub failure"));
            }
            Ok(format!("card {value}"))
        }
    }

    fn indexed_batch(count: u8) -> RunBatch {
        (0..count)
            .map(|v| {
                let img = image::GrayImage::from_pixel(8, 8, image::Luma([v]));
                CardImage::new(DynamicImage::ImageLuma8(img))
            })
            .collect()
    }

    fn passthrough() -> PreprocessConfig {
        PreprocessConfig {
            min_width: 1,
            upscale_factor: 1,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_outcomes_follow_submission_order() {
        let dispatcher = OcrDispatcher::new(Arc::new(IndexedStub::new(None)), passthrough(), 8);
        let outcomes = dispatcher.recognize_batch(indexed_batch(30)).await.unwrap();

        assert_eq!(outcomes.len(), 30);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(outcome.text, format!("card {i}"));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_failure_degrades_to_empty_outcome() {
        let dispatcher = OcrDispatcher::new(Arc::new(IndexedStub::new(Some(17))), passthrough(), 8);
        let outcomes = dispatcher.recognize_batch(indexed_batch(30)).await.unwrap();

        assert_eq!(outcomes.len(), 30);
        assert!(outcomes[17].is_empty());
        assert_eq!(outcomes[16].text, "card 16");
        assert_eq!(outcomes[18].text, "card 18");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_semaphore_bounds_parallelism() {
        let stub = Arc::new(IndexedStub::new(None));
        let dispatcher = OcrDispatcher::new(Arc::clone(&stub), passthrough(), 2);
        dispatcher.recognize_batch(indexed_batch(12)).await.unwrap();

        assert!(stub.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_batch_yields_no_outcomes() {
        let dispatcher = OcrDispatcher::new(Arc::new(IndexedStub::new(None)), passthrough(), 4);
        let outcomes = dispatcher.recognize_batch(Vec::new()).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let dispatcher = OcrDispatcher::new(Arc::new(IndexedStub::new(None)), passthrough(), 0);
        let outcomes = dispatcher.recognize_batch(indexed_batch(3)).await.unwrap();
        assert_eq!(outcomes.len(), 3);
    }
}
