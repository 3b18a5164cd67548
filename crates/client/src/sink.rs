// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The telemetry sink seam.

use async_trait::async_trait;
use buildwatch_core::{AnnotationRecord, MetricRecord};

use crate::error::Result;

/// Destination for derived telemetry.
///
/// Implementations make a single attempt per call; retry policy belongs to
/// neither the sink nor its callers.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Push a batch of metrics. One authenticated round trip.
    async fn push_metrics(&self, metrics: &[MetricRecord]) -> Result<()>;

    /// Push a batch of annotations. One authenticated round trip; an empty
    /// batch is a legal no-op.
    async fn push_annotations(&self, annotations: &[AnnotationRecord]) -> Result<()>;

    /// Deliver one run's records together: metrics first, then annotations
    /// when the batch is non-empty. Implementations that can share one
    /// authenticated session across both pushes override this; the default
    /// makes one round trip per batch.
    async fn deliver(
        &self,
        metrics: &[MetricRecord],
        annotations: &[AnnotationRecord],
    ) -> Result<()> {
        self.push_metrics(metrics).await?;
        if !annotations.is_empty() {
            self.push_annotations(annotations).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use buildwatch_core::TagSet;
    use std::sync::Mutex;

    struct RecordingSink {
        metric_pushes: Mutex<usize>,
        annotation_pushes: Mutex<usize>,
        fail_metrics: bool,
    }

    impl RecordingSink {
        fn new(fail_metrics: bool) -> Self {
            RecordingSink {
                metric_pushes: Mutex::new(0),
                annotation_pushes: Mutex::new(0),
                fail_metrics,
            }
        }
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn push_metrics(&self, _metrics: &[MetricRecord]) -> Result<()> {
            *self.metric_pushes.lock().unwrap() += 1;
            if self.fail_metrics {
                return Err(SinkError::TokenExpired);
            }
            Ok(())
        }

        async fn push_annotations(&self, _annotations: &[AnnotationRecord]) -> Result<()> {
            *self.annotation_pushes.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn metric() -> MetricRecord {
        MetricRecord::new("ci", "build.status", TagSet::new(), 1_700_000_000, 0.0)
    }

    #[tokio::test]
    async fn test_default_deliver_skips_empty_annotation_batch() {
        let sink = RecordingSink::new(false);
        sink.deliver(&[metric()], &[]).await.unwrap();
        assert_eq!(*sink.metric_pushes.lock().unwrap(), 1);
        assert_eq!(*sink.annotation_pushes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_default_deliver_stops_after_metric_failure() {
        let sink = RecordingSink::new(true);
        let annotations = vec![AnnotationRecord {
            scope: "ci".to_string(),
            timestamp: 1_700_000_000,
            id: "id".to_string(),
            source: "ci.example.com".to_string(),
            annotation_type: "BUILD".to_string(),
            metric: "build.status".to_string(),
            tags: TagSet::new(),
            fields: Default::default(),
        }];
        let result = sink.deliver(&[metric()], &annotations).await;
        assert!(matches!(result, Err(SinkError::TokenExpired)));
        assert_eq!(*sink.metric_pushes.lock().unwrap(), 1);
        assert_eq!(*sink.annotation_pushes.lock().unwrap(), 0);
    }
}
